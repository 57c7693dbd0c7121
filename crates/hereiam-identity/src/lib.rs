pub mod credentials;
pub mod error;
pub mod provider;
pub mod validation;

pub use credentials::{AuthenticatedUser, EmailPasswordCredentials};
pub use error::{AuthError, AuthErrorKind, SubmitRejected};
pub use provider::{IdentityProvider, RemoteFunction, RemoteFunctions};
pub use validation::{FieldErrors, LoginForm, RegisterForm, Registration};
