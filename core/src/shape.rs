use serde::{Deserialize, Serialize};

/// How associations are laid out in the assembled document.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Shape {
  /// Associations are rendered inline.
  ///
  /// Members are not de-duplicated, so a back-reference (a comment's `post`) renders again at every
  /// level until `MAX_NESTING_DEPTH` fails the call with `NestingTooDeep`. Use `SideLoaded` for cyclic
  /// graphs.
  #[default]
  Embedded,
  /// Associations are rendered as identifier arrays (`comment_ids`).
  Referenced,
  /// Identifier references inline, full members in top-level collections.
  SideLoaded,
}
