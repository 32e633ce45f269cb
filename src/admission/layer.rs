//! `tower` middleware wiring for the admission pipeline and authorization gates.
//!
//! Stack [`AdmissionLayer`] once around the whole router and [`GateLayer`] around individual
//! routes:
//!
//! ```ignore
//! let app = ServiceBuilder::new()
//! 	.layer(AdmissionLayer::new(pipeline))
//! 	.layer(GateLayer::new(Gate::Activated))
//! 	.service(handler);
//! ```
//!
//! Rejections are rendered with
//! [`Rejection::into_response`](crate::admission::Rejection::into_response), so the response
//! body type must implement `From<String>`.

// std
use std::{
	future,
	task::{Context, Poll},
};
// crates.io
use http::{HeaderValue, Request, Response, header::VARY};
use tower::{Layer, Service};
// self
use crate::{
	_prelude::*,
	admission::{AdmissionPipeline, Gate},
	auth::Identity,
};

type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// Transport peer address, inserted into request extensions by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeerAddr(pub SocketAddr);

/// Layer running [`AdmissionPipeline::admit`] before the inner service.
#[derive(Clone, Debug)]
pub struct AdmissionLayer {
	pipeline: AdmissionPipeline,
}
impl AdmissionLayer {
	/// Wraps services with `pipeline`.
	pub fn new(pipeline: AdmissionPipeline) -> Self {
		Self { pipeline }
	}
}
impl<S> Layer<S> for AdmissionLayer {
	type Service = AdmissionService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		AdmissionService { inner, pipeline: self.pipeline.clone() }
	}
}

/// Service produced by [`AdmissionLayer`].
///
/// Admitted requests reach the inner service with their [`Identity`] in the extensions.
/// Every response, rejection or not, varies on `Authorization`.
#[derive(Clone, Debug)]
pub struct AdmissionService<S> {
	inner: S,
	pipeline: AdmissionPipeline,
}
impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AdmissionService<S>
where
	S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
	S::Future: Send,
	ReqBody: Send + 'static,
	ResBody: From<String> + Send + 'static,
{
	type Error = S::Error;
	type Future = BoxFuture<Self::Response, Self::Error>;
	type Response = Response<ResBody>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
		// Keep the instance that was driven to readiness.
		let clone = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, clone);
		let pipeline = self.pipeline.clone();

		Box::pin(async move {
			let peer = request.extensions().get::<PeerAddr>().map(|peer| peer.0.ip());
			let mut response = match pipeline.admit(request.headers(), peer).await {
				Ok(identity) => {
					request.extensions_mut().insert(identity);

					inner.call(request).await?
				},
				Err(rejection) => rejection.into_response(),
			};

			response.headers_mut().append(VARY, HeaderValue::from_static("authorization"));

			Ok(response)
		})
	}
}

/// Layer enforcing a [`Gate`] on the [`Identity`] attached by [`AdmissionLayer`].
///
/// A request without an attached identity is treated as anonymous.
#[derive(Clone, Copy, Debug)]
pub struct GateLayer {
	gate: Gate,
}
impl GateLayer {
	/// Wraps services with `gate`.
	pub fn new(gate: Gate) -> Self {
		Self { gate }
	}
}
impl<S> Layer<S> for GateLayer {
	type Service = GateService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		GateService { inner, gate: self.gate }
	}
}

/// Service produced by [`GateLayer`].
///
/// A rejected request gives up the readied inner instance without calling it.
#[derive(Clone, Debug)]
pub struct GateService<S> {
	inner: S,
	gate: Gate,
}
impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for GateService<S>
where
	S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone,
	S::Error: Send + 'static,
	S::Future: Send + 'static,
	ResBody: From<String> + Send + 'static,
{
	type Error = S::Error;
	type Future = BoxFuture<Self::Response, Self::Error>;
	type Response = Response<ResBody>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
		let admitted = match request.extensions().get::<Identity>() {
			Some(identity) => self.gate.check(identity).map(|_| ()),
			None => self.gate.check(&Identity::Anonymous).map(|_| ()),
		};

		let clone = self.inner.clone();
		let mut inner = std::mem::replace(&mut self.inner, clone);

		match admitted {
			Ok(()) => Box::pin(inner.call(request)),
			Err(rejection) => {
				drop(inner);

				Box::pin(future::ready(Ok(rejection.into_response())))
			},
		}
	}
}

/// Reads the identity attached by [`AdmissionLayer`], defaulting to anonymous.
pub fn identity_of<B>(request: &Request<B>) -> Identity {
	request.extensions().get::<Identity>().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		convert::Infallible,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// crates.io
	use http::StatusCode;
	use tower::ServiceExt;
	// self
	use super::*;
	use crate::{_preludet::*, auth::Subject};

	/// Inner service holding one slot of a shared pool from readiness until it is called.
	#[derive(Debug)]
	struct SlotService {
		in_use: Arc<AtomicUsize>,
		reserved: bool,
	}
	impl SlotService {
		fn new(in_use: Arc<AtomicUsize>) -> Self {
			Self { in_use, reserved: false }
		}

		fn release(&mut self) {
			if std::mem::take(&mut self.reserved) {
				self.in_use.fetch_sub(1, Ordering::SeqCst);
			}
		}
	}
	impl Clone for SlotService {
		fn clone(&self) -> Self {
			Self::new(self.in_use.clone())
		}
	}
	impl Drop for SlotService {
		fn drop(&mut self) {
			self.release();
		}
	}
	impl Service<Request<()>> for SlotService {
		type Error = Infallible;
		type Future = future::Ready<Result<Response<String>, Infallible>>;
		type Response = Response<String>;

		fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
			if !self.reserved {
				self.reserved = true;
				self.in_use.fetch_add(1, Ordering::SeqCst);
			}

			Poll::Ready(Ok(()))
		}

		fn call(&mut self, _: Request<()>) -> Self::Future {
			self.release();

			future::ready(Ok(Response::new("handled".to_owned())))
		}
	}

	#[tokio::test]
	async fn rejected_requests_release_the_readied_inner_service() {
		let in_use = Arc::new(AtomicUsize::new(0));
		let mut service =
			GateLayer::new(Gate::Authenticated).layer(SlotService::new(in_use.clone()));
		let response = service
			.ready()
			.await
			.expect("Gate should become ready.")
			.call(Request::new(()))
			.await
			.expect("Gate should answer.");

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(in_use.load(Ordering::SeqCst), 0);

		let mut request = Request::new(());

		request
			.extensions_mut()
			.insert(Identity::Authenticated(Subject::new(subject_id("admin-1"), false)));

		let response = service
			.ready()
			.await
			.expect("Gate should become ready.")
			.call(request)
			.await
			.expect("Gate should answer.");

		assert_eq!(response.body(), "handled");
		assert_eq!(in_use.load(Ordering::SeqCst), 0);
	}
}
