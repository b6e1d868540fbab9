//! # photo-replicate CLI
//!
//! Command-line interface for the photo replicator.
//!
//! ## Usage
//! ```bash
//! photo-replicate --src /media/card/DCIM --dest ~/Pictures --cleanup
//! photo-replicate --src ./in --dest ./out --both --dry-run --output json
//! ```

mod cli;

use photo_replicator::Result;

fn main() -> Result<()> {
    cli::run()
}
