// crates.io
use tracing::instrument::Instrumented;
// self
use crate::{_prelude::*, auth::TokenKind};

/// A span wrapping one renewal check.
#[derive(Clone, Debug)]
pub struct RenewalSpan {
	span: tracing::Span,
}
impl RenewalSpan {
	/// Creates a new span tagged with the provided token kind + stage.
	pub fn new(kind: TokenKind, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("token_keeper.renewal", kind = kind.as_str(), stage) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}
