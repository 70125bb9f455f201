//! Built-in stages.
//!
//! | Name      | Priority | Factory key | Writes                                       |
//! |-----------|----------|-------------|----------------------------------------------|
//! | `base`    | 0        | `base`      | `units` and `theme` capabilities             |
//! | `page`    | 1        | `page`      | `page`, `headers`, `footers`, `fontMapper`   |
//! | `default` | 100      | `text`      | `text`                                       |

pub mod base;
pub mod page;
pub mod text;

pub use base::BaseStage;
pub use page::PageStage;
pub use text::TextStage;
