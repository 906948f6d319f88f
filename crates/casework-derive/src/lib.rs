//! Casework Derive Macros: build-time test group registration
//!
//! `#[test_group]` turns an inherent `impl` block into a
//! `casework::TestGroup`, so a test library can be discovered without
//! runtime reflection. Methods are described in declaration order.
//!
//! # Method Attributes
//!
//! | Attribute | Member kind |
//! |---|---|
//! | `#[test_case]` | test case |
//! | `#[test_case(tags = "a,b", timeout_ms = 500, name = "Alias")]` | test case with metadata |
//! | `#[suite_init]`, `#[suite_cleanup]` | once per run |
//! | `#[class_init]`, `#[class_cleanup]` | once per class |
//! | `#[test_init]`, `#[test_cleanup]` | around every attempt |
//!
//! Annotated methods take `(&self, &ExecutionContext)` and return
//! `CaseResult<()>`. Unannotated methods are described as helpers.
//!
//! # Example
//!
//! ```ignore
//! use casework::prelude::*;
//!
//! #[derive(Default)]
//! struct BlobScenarios;
//!
//! #[test_group(name = "Blobs")]
//! impl BlobScenarios {
//!     #[class_init]
//!     fn create_container(&self, _ctx: &ExecutionContext) -> CaseResult<()> {
//!         Ok(())
//!     }
//!
//!     #[test_case(tags = "smoke,blob", timeout_ms = 30_000)]
//!     fn upload_block(&self, ctx: &ExecutionContext) -> CaseResult<()> {
//!         ensure(ctx.lang().is_some(), "lang is required")
//!     }
//! }
//!
//! let library = SuiteLibrary::new("storage").with_group::<BlobScenarios>();
//! ```

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{Attribute, FnArg, ImplItem, ImplItemFn, ItemImpl, LitInt, LitStr, Type};

/// Register an inherent `impl` block as a test group.
///
/// # Attributes
///
/// - `#[test_group(name = "Alias")]` - Override the class name (defaults to the type name)
#[proc_macro_attribute]
pub fn test_group(attr: TokenStream, item: TokenStream) -> TokenStream {
    match expand(attr.into(), item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Role a method plays in the group
#[derive(Debug, Clone, PartialEq, Eq)]
enum Role {
    Case {
        name: Option<String>,
        tags: Vec<String>,
        timeout_ms: Option<u64>,
    },
    Hook(&'static str),
    Helper,
}

const HOOK_ATTRS: [(&str, &str); 6] = [
    ("suite_init", "SuiteInit"),
    ("suite_cleanup", "SuiteCleanup"),
    ("class_init", "ClassInit"),
    ("class_cleanup", "ClassCleanup"),
    ("test_init", "TestInit"),
    ("test_cleanup", "TestCleanup"),
];

fn expand(attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    let alias = parse_group_name(attr)?;
    let mut item: ItemImpl = syn::parse2(item)?;

    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[test_group] goes on an inherent impl block, not a trait impl",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "#[test_group] does not support generic types",
        ));
    }

    let class_name = match alias {
        Some(name) => name,
        None => type_name(&item.self_ty)?,
    };

    let mut members = Vec::new();
    for impl_item in &mut item.items {
        if let ImplItem::Fn(method) = impl_item {
            let role = take_role(&mut method.attrs)?;
            members.push(describe_member(method, &role)?);
        }
    }

    let self_ty = &item.self_ty;
    Ok(quote! {
        #item

        impl ::casework::TestGroup for #self_ty {
            fn describe(self: ::std::sync::Arc<Self>) -> ::casework::TypeDescriptor {
                ::casework::TypeDescriptor::test_group(#class_name)
                    #(.with_member(#members))*
            }
        }
    })
}

/// Parse `name = "..."` from the outer attribute
fn parse_group_name(attr: TokenStream2) -> syn::Result<Option<String>> {
    let mut name = None;
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            let value: LitStr = meta.value()?.parse()?;
            name = Some(value.value());
            Ok(())
        } else {
            Err(meta.error("unsupported test_group property, expected `name`"))
        }
    });
    syn::parse::Parser::parse2(parser, attr)?;
    Ok(name)
}

/// Last path segment of the implementing type
fn type_name(ty: &Type) -> syn::Result<String> {
    if let Type::Path(path) = ty {
        if let Some(segment) = path.path.segments.last() {
            return Ok(segment.ident.to_string());
        }
    }
    Err(syn::Error::new_spanned(
        ty,
        "cannot derive a class name; use #[test_group(name = \"...\")]",
    ))
}

/// Find and remove the role attribute of a method
fn take_role(attrs: &mut Vec<Attribute>) -> syn::Result<Role> {
    let mut role = Role::Helper;
    let mut seen: Option<Span> = None;
    let mut error: Option<syn::Error> = None;

    attrs.retain(|attr| {
        let parsed = if attr.path().is_ident("test_case") {
            parse_case_attr(attr)
        } else if let Some((_, variant)) = HOOK_ATTRS
            .iter()
            .find(|(ident, _)| attr.path().is_ident(ident))
        {
            match &attr.meta {
                syn::Meta::Path(_) => Ok(Role::Hook(*variant)),
                _ => Err(syn::Error::new_spanned(attr, "hook attributes take no arguments")),
            }
        } else {
            return true;
        };

        let span = attr.path().get_ident().map_or_else(Span::call_site, syn::Ident::span);
        match parsed {
            Ok(found) if seen.is_none() => {
                role = found;
                seen = Some(span);
            }
            Ok(_) => {
                error.get_or_insert_with(|| {
                    syn::Error::new(span, "a method can carry only one casework attribute")
                });
            }
            Err(err) => {
                error.get_or_insert(err);
            }
        }
        false
    });

    match error {
        Some(err) => Err(err),
        None => Ok(role),
    }
}

fn parse_case_attr(attr: &Attribute) -> syn::Result<Role> {
    let mut name = None;
    let mut tags = Vec::new();
    let mut timeout_ms = None;

    if let syn::Meta::List(_) = &attr.meta {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("tags") {
                let value: LitStr = meta.value()?.parse()?;
                tags = split_tags(&value.value());
                Ok(())
            } else if meta.path.is_ident("timeout_ms") {
                let value: LitInt = meta.value()?.parse()?;
                timeout_ms = Some(value.base10_parse::<u64>()?);
                Ok(())
            } else if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported test_case property, expected `tags`, `timeout_ms` or `name`"))
            }
        })?;
    }

    Ok(Role::Case {
        name,
        tags,
        timeout_ms,
    })
}

/// Split a comma-separated tag list
fn split_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Build the `MemberDescriptor` expression for one method
fn describe_member(method: &ImplItemFn, role: &Role) -> syn::Result<TokenStream2> {
    let ident = &method.sig.ident;
    let method_name = ident.to_string();

    Ok(match role {
        Role::Helper => quote! { ::casework::MemberDescriptor::helper(#method_name) },
        Role::Case {
            name,
            tags,
            timeout_ms,
        } => {
            check_signature(method)?;
            let call = bound_call(ident);
            let case_name = name.clone().unwrap_or(method_name);
            let with_tags = (!tags.is_empty()).then(|| quote! { .with_tags([#(#tags),*]) });
            let with_timeout = timeout_ms.map(|ms| quote! { .with_timeout_ms(#ms) });
            quote! {
                ::casework::MemberDescriptor::test_case(
                    #case_name,
                    ::casework::CaseMetadata::new() #with_tags #with_timeout,
                    #call,
                )
            }
        }
        Role::Hook(variant) => {
            check_signature(method)?;
            let call = bound_call(ident);
            let variant = format_ident!("{}", variant);
            quote! {
                ::casework::MemberDescriptor::hook(
                    ::casework::HookKind::#variant,
                    #method_name,
                    #call,
                )
            }
        }
    })
}

/// Closure calling `ident` on a shared handle to the group instance
fn bound_call(ident: &syn::Ident) -> TokenStream2 {
    quote! {
        {
            let this = ::std::sync::Arc::clone(&self);
            move |ctx: &::casework::ExecutionContext| this.#ident(ctx)
        }
    }
}

/// Annotated methods must be `fn(&self, &ExecutionContext)`
fn check_signature(method: &ImplItemFn) -> syn::Result<()> {
    let sig = &method.sig;
    let mut inputs = sig.inputs.iter();
    let receiver_ok = matches!(
        inputs.next(),
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() && receiver.mutability.is_none()
    );
    if !receiver_ok || inputs.count() != 1 {
        return Err(syn::Error::new_spanned(
            sig,
            "casework methods take `&self` and `&ExecutionContext`",
        ));
    }
    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            sig.asyncness,
            "casework methods are synchronous",
        ));
    }
    Ok(())
}
