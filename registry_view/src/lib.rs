//! # Registry View
//!
//! Pure naming and listing logic for presenting a registry as a directory
//! tree. Nothing here talks to a store.
//!
//! ## Philosophy
//!
//! - **Names must survive the trip**: Every raw key or value name maps to one
//!   filename and back, even names holding `/` or colliding with a sibling
//! - **Listings are resumable**: A directory position is a plain integer a
//!   caller can hold and hand back
//! - **The root is fixed**: The mount root lists a static catalog
//!
//! ## Design
//!
//! - [`NameCodec`] escapes separators and reserved characters as `%xx`
//! - [`RootCatalog`] is an immutable static table
//! - [`DirCursor`] keeps listing state unpacked and narrows it only on `tell`
//! - [`SeenNames`] is a probabilistic set; hits must be confirmed

pub mod codec;
pub mod cursor;
pub mod path;
pub mod roots;
pub mod seen;

pub use codec::{CodecError, DecodedName, NameCodec, NAME_MAX, VALUE_SUFFIX};
pub use cursor::{DirCursor, Phase, TELL_MASK};
pub use path::RegistryPath;
pub use roots::{RootCatalog, RootEntry};
pub use seen::SeenNames;
