//! Output emitters. Both write to any `io::Write` so the CLI can target a
//! file or stdout.
pub mod csharp;
pub mod json;
