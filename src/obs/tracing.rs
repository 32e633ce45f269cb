// self
use crate::{_prelude::*, obs::Stage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// A span builder used by pipeline stages and token operations.
#[derive(Clone, Debug)]
pub struct StageSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl StageSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: Stage) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!("token_admission.stage", stage = stage.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a server-side fault with its full source chain before it is flattened for clients.
pub fn report_internal(stage: Stage, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		let chain = error_chain(error);

		tracing::error!(stage = stage.as_str(), error = %chain, "internal failure");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, error);
	}
}

#[cfg(feature = "tracing")]
fn error_chain(error: &Error) -> String {
	let mut chain = error.to_string();
	let mut source = std::error::Error::source(error);

	while let Some(cause) = source {
		chain.push_str(": ");
		chain.push_str(&cause.to_string());

		source = cause.source();
	}

	chain
}

/// Logs a client turned away by a stage.
pub fn report_rejection(stage: Stage, reason: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(stage = stage.as_str(), reason, "request rejected");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, reason);
	}
}

/// Logs the result of one eviction sweep.
pub fn report_sweep(evicted: usize, tracked: usize) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(evicted, tracked, "client limiter sweep finished");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (evicted, tracked);
	}
}
