use thiserror::Error;

/// Contract violations. These abort only the call that returned them.
#[derive(Debug, Error)]
pub enum Error {
	#[error("invalid element: expected an element node but found {0}")]
	InvalidElement(String),

	#[error("{0} is not observable")]
	NotObservable(String),

	#[error("the binding target no longer exists")]
	TargetDropped,

	#[error("no document is available to create nodes in")]
	NoDocument,

	#[error("DOM operation failed: {0}")]
	Dom(String),

	#[error(transparent)]
	Path(#[from] PathError),

	#[error(transparent)]
	Registration(#[from] RegistrationError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
	#[error("property path {0:?} is empty after cleaning")]
	Empty(String),

	#[error("{segment:?} is undefined while resolving {path:?}")]
	Undefined { path: String, segment: String },

	#[error("{segment:?} is not an object while resolving {path:?}")]
	NotAnObject { path: String, segment: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
	#[error("{0:?} does not include a namespace, e.g. \"my{1}\"")]
	MissingNamespace(String, String),

	#[error("custom attributes cannot use the reserved {namespace:?} namespace ({name:?})")]
	ReservedNamespace { namespace: String, name: String },
}

/// Why a template URL couldn't be loaded. Recoverable: the view falls back to empty content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateLoadError {
	#[error("no template loader is configured to fetch {0:?}")]
	MissingLoader(String),

	#[error("template {0:?} not found")]
	NotFound(String),

	#[error("failed to load template {url:?}: {message}")]
	Failed { url: String, message: String },
}
