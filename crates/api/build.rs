//! Build script for the api crate.
//!
//! `sqlx::migrate!` embeds the migration files at compile time; Cargo does not
//! notice new files in that directory on its own.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
