use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Analyze;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Extract, Categorize }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Extract => "extract",
        Phase::Categorize => "categorize",
    }}
    fn span(&self) -> Span { match self {
        Phase::Extract => info_span!("extract"),
        Phase::Categorize => info_span!("categorize"),
    }}
}

impl OpMarker for Analyze {
    const NAME: &'static str = "analyze";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("analyze") }
}
