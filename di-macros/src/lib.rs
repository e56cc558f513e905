//! Compile-time dependency injection macros for docshift.
//!
//! This crate provides derive macros for DI:
//! - `#[derive(Context)]` to make a struct's fields extractable
//! - `#[derive(FromContext)]` to auto-resolve fields from a context
//!
//! The `FromRef` trait must be defined in the consuming crate or imported
//! from a shared crate. By default, generated code references `crate::FromRef`.

use proc_macro::TokenStream;

mod context;
mod fields;
mod from_context;

/// Derive macro for creating a DI context.
///
/// When applied to a struct, generates `FromRef` implementations for each
/// field type, allowing them to be extracted from the context.
///
/// # Requirements
///
/// - All resolved fields must implement `Clone` and have distinct types
/// - The struct itself should derive `Clone`
///
/// # Example
///
/// ```ignore
/// use di_macros::{Context, FromRef};
///
/// #[derive(Context, Clone)]
/// pub struct Context {
///     pub legacy: Arc<dyn LegacySource>,
///     pub documents: Arc<dyn DocumentStore>,
///     pub config: Arc<Config>,
/// }
///
/// // Generated implementations:
/// // impl FromRef<Context> for Arc<dyn LegacySource> { ... }
/// // impl FromRef<Context> for Arc<dyn DocumentStore> { ... }
/// // impl FromRef<Context> for Arc<Config> { ... }
/// ```
#[proc_macro_derive(Context)]
pub fn derive_context(input: TokenStream) -> TokenStream {
    context::derive_context_impl(input)
}

/// Derive macro for types that can be constructed from a context.
///
/// When applied to a struct, generates a `FromRef<Context>` implementation
/// that resolves each field by calling `FromRef::from_ref` on the context.
///
/// # Requirements
///
/// - Each field type must implement `FromRef<Context>`
/// - The context type defaults to `Context` but can be overridden with
///   `#[from_context(Context = MyContext)]`
///
/// # Example
///
/// ```ignore
/// use di_macros::{FromContext, FromRef};
///
/// #[derive(FromContext, Clone)]
/// pub struct CompanyMigrator {
///     mapper: IdMapper,            // resolved via IdMapper::from_ref(ctx)
///     documents: DocumentRepository,
///     config: Arc<Config>,
/// }
///
/// // Generated implementation:
/// // impl FromRef<Context> for CompanyMigrator {
/// //     fn from_ref(ctx: &Context) -> Self {
/// //         Self {
/// //             mapper: IdMapper::from_ref(ctx),
/// //             documents: DocumentRepository::from_ref(ctx),
/// //             config: <Arc<Config>>::from_ref(ctx),
/// //         }
/// //     }
/// // }
/// ```
///
/// # Default Fields
///
/// Fields marked `#[from_context(default)]` are not resolved from the
/// context and start at `Default::default()`, for per-instance settings:
///
/// ```ignore
/// #[derive(FromContext, Clone)]
/// pub struct TagMigrator {
///     mapper: IdMapper,
///     #[from_context(default)]
///     admin: bool,
/// }
/// ```
///
/// # Custom Context Type
///
/// ```ignore
/// #[derive(FromContext)]
/// #[from_context(Context = "TestContext")]
/// pub struct IdMapper {
///     legacy: Arc<dyn LegacySource>,
/// }
/// ```
#[proc_macro_derive(FromContext, attributes(from_context))]
pub fn derive_from_context(input: TokenStream) -> TokenStream {
    from_context::derive_from_context_impl(input)
}
