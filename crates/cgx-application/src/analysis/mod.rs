//! Read-side analysis engines over the graph store.

mod dead_code;
mod impact;
mod traversal;

pub use dead_code::{
    Confidence, DeadCodeCategory, DeadCodeEngine, DeadCodeItem, DeadCodeKind, DeadCodeOptions,
    DeadCodeReport, EntryPointAudit,
};
pub use impact::{
    FrameworkWeights, ImpactAnalysis, ImpactEngine, ImpactTarget, RiskLevel, WeightedDependent,
    compute_risk_score,
};
pub use traversal::{
    ChainGroup, DepthLayer, TraversalEngine, TraversalOptions, TraversalReport, TraversedNode,
};
