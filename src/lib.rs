//! Block editor toolbox facade.
//!
//! Re-exports the normalized model and pipeline from `toolbox-core` and the
//! parsing/flattening layer as [`xml`].
//!
//! ```
//! let categories = toolbox_rs::parse_toolbox(
//!     r#"<xml><category name="Math"><block type="math_number"/></category></xml>"#,
//! )
//! .unwrap();
//! assert_eq!(categories[0].blocks()[0].block_type, "math_number");
//! ```

pub use toolbox_core::*;
pub use toolbox_xml as xml;
