use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Extract;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Classify, FastPath, Render, Strategy }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Classify => "classify",
        Phase::FastPath => "fast_path",
        Phase::Render => "render",
        Phase::Strategy => "strategy",
    }}
    fn span(&self) -> Span { match self {
        Phase::Classify => info_span!("classify"),
        Phase::FastPath => info_span!("fast_path"),
        Phase::Render => info_span!("render"),
        Phase::Strategy => info_span!("strategy"),
    }}
}

impl OpMarker for Extract {
    const NAME: &'static str = "extract";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("extract") }
}
