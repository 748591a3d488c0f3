/// Source-side item text (e.g. a receptor sequence).
/// Example: `CASSLGQAYEQYF`
pub type SourceItem = String;
/// Target-side item text (e.g. an antigen fragment sequence).
/// Example: `GILGFVFTL`
pub type TargetItem = String;
/// Label-independent deduplication key over a pairing.
/// Example: `("CASSLGQAYEQYF", "GILGFVFTL")`
pub type PairKey = (SourceItem, TargetItem);
/// Column header in a tabular corpus.
/// Examples: `source_item`, `antigen.epitope`
pub type ColumnName = String;
/// Corpus name used in error and log messages.
/// Examples: `positives`, `reference`, `background`
pub type CorpusName = String;
