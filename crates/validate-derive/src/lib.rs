//! Derive macros for `model_validations_ports::TagValidate` and
//! `model_validations_ports::Model`.

mod schema;
mod tag_rules;

use proc_macro::TokenStream;
use syn::{Data, DeriveInput, Field, Fields, GenericArgument, PathArguments, Type};

/// Derive `model_validations_ports::TagValidate` from `#[valid(...)]` field rules.
///
/// Supported rules: `required`, `length(min = N, max = M)`, `numeric`,
/// `email`, `custom(with = "path", message = "...")` and `nested`.
/// `field = "Name"` overrides the reported field name.
#[proc_macro_derive(TagValidate, attributes(valid))]
pub fn derive_tag_validate(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match tag_rules::expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `model_validations_ports::Model` from `#[model(...)]` attributes.
///
/// Container: `table = "..."`, `validator`, `validator_with_error`.
/// Field: `primary_key`, `column = "..."`, `has_one`, `has_many`, `skip`.
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match schema::expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> Result<impl Iterator<Item = &'a Field>, syn::Error> {
    let Data::Struct(struct_data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            format!("{derive} can only be derived for structs"),
        ));
    };

    match &struct_data.fields {
        Fields::Named(fields) => Ok(fields.named.iter()),
        _ => Err(syn::Error::new_spanned(
            &struct_data.fields,
            format!("{derive} requires named fields"),
        )),
    }
}

fn unwrap_option(ty: &Type) -> (bool, &Type) {
    wrapped_inner(ty, "Option").map_or((false, ty), |inner| (true, inner))
}

fn wrapped_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let mut type_arg = None;
    for arg in &args.args {
        if let GenericArgument::Type(inner) = arg {
            type_arg = Some(inner);
            break;
        }
    }
    type_arg
}

fn ident_text(ident: &syn::Ident) -> String {
    let text = ident.to_string();
    text.strip_prefix("r#").map_or_else(|| text.clone(), str::to_string)
}

/// `credit_card_number` -> `CreditCardNumber`.
fn pascal_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect()
}

/// `CreditCard` -> `credit_card`.
fn snake_case(pascal: &str) -> String {
    let mut out = String::with_capacity(pascal.len() + 4);
    for (index, ch) in pascal.chars().enumerate() {
        if ch.is_uppercase() {
            if index > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// English plural of a snake_case noun, good enough for table names.
fn pluralize(noun: &str) -> String {
    if noun.ends_with('s')
        || noun.ends_with('x')
        || noun.ends_with('z')
        || noun.ends_with("ch")
        || noun.ends_with("sh")
    {
        return format!("{noun}es");
    }
    if let Some(stem) = noun.strip_suffix('y') {
        let before_vowel = stem
            .chars()
            .last()
            .is_some_and(|ch| matches!(ch, 'a' | 'e' | 'i' | 'o' | 'u'));
        if !stem.is_empty() && !before_vowel {
            return format!("{stem}ies");
        }
    }
    format!("{noun}s")
}
