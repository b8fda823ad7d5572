pub mod content;
pub mod style;
pub mod total_variation;
pub mod combined;

pub use content::ContentLoss;
pub use style::{gram_matrix, StyleLoss};
pub use total_variation::TotalVariationLoss;
pub use combined::{evaluate, Evaluation, LossBreakdown, LossWeights, StyleTargets};
