/// Data layer: wire types, row selection, and ternary normalization.
///
/// Architecture:
/// ```text
///  /upload  /upload_wfdb  (server JSON)
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  wire responses → UploadedFile / EcgRecord
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ selection │  per-row inclusion flags, index-aligned
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ normalize │  selected rows → class groups on the unit simplex
///   └──────────┘
/// ```

pub mod model;
pub mod normalize;
pub mod selection;
