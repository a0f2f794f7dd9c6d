use crate::{ident_text, named_fields, pascal_case, unwrap_option};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Attribute, DeriveInput, Ident, LitInt, LitStr, Path};

#[derive(Debug)]
enum Rule {
    Length { min: usize, max: usize },
    Numeric,
    Email,
    Custom { with: Path, message: Option<String> },
}

#[derive(Debug, Default)]
struct FieldRules {
    name: Option<String>,
    required: bool,
    nested: bool,
    rules: Vec<Rule>,
}

pub fn expand(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let mut checks = Vec::new();
    for field in named_fields(input, "TagValidate")? {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let parsed = parse_field_rules(&field.attrs)?;
        let field_name = parsed
            .name
            .clone()
            .unwrap_or_else(|| pascal_case(&ident_text(ident)));
        let field_name = LitStr::new(&field_name, Span::call_site());

        if parsed.nested {
            if parsed.required || !parsed.rules.is_empty() {
                return Err(syn::Error::new_spanned(
                    ident,
                    "valid(nested) cannot be combined with other rules",
                ));
            }
            let (is_option, _) = unwrap_option(&field.ty);
            checks.push(expand_nested(ident, &field_name, is_option));
            continue;
        }
        if !parsed.required && parsed.rules.is_empty() {
            continue;
        }
        checks.push(expand_rules(ident, &field_name, &parsed));
    }

    let body = if checks.is_empty() {
        quote! {
            let _ = scope;
            ::core::result::Result::Ok(())
        }
    } else {
        quote! {
            let _ = scope;
            let mut failures: ::std::vec::Vec<::model_validations_ports::RawFailure> =
                ::std::vec::Vec::new();
            #(#checks)*
            ::model_validations_ports::RawFailure::collect(failures)
        }
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::model_validations_ports::TagValidate for #name #ty_generics #where_clause {
            fn validate_tags(
                &self,
                scope: &dyn ::model_validations_ports::Scope,
            ) -> ::core::result::Result<(), ::model_validations_ports::RawFailure> {
                #body
            }
        }
    })
}

fn parse_field_rules(attrs: &[Attribute]) -> Result<FieldRules, syn::Error> {
    let mut parsed = FieldRules::default();
    for attr in attrs {
        if !attr.path().is_ident("valid") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("field") {
                let value: LitStr = meta.value()?.parse()?;
                if parsed.name.is_some() {
                    return Err(meta.error("duplicate valid(field = ...)"));
                }
                parsed.name = Some(value.value());
                return Ok(());
            }
            if meta.path.is_ident("required") {
                parsed.required = true;
                return Ok(());
            }
            if meta.path.is_ident("nested") {
                parsed.nested = true;
                return Ok(());
            }
            if meta.path.is_ident("numeric") {
                parsed.rules.push(Rule::Numeric);
                return Ok(());
            }
            if meta.path.is_ident("email") {
                parsed.rules.push(Rule::Email);
                return Ok(());
            }
            if meta.path.is_ident("length") {
                let mut min: Option<usize> = None;
                let mut max: Option<usize> = None;
                meta.parse_nested_meta(|nested| {
                    if nested.path.is_ident("min") {
                        let lit: LitInt = nested.value()?.parse()?;
                        min = Some(lit.base10_parse()?);
                        return Ok(());
                    }
                    if nested.path.is_ident("max") {
                        let lit: LitInt = nested.value()?.parse()?;
                        max = Some(lit.base10_parse()?);
                        return Ok(());
                    }
                    Err(nested.error("unsupported length attribute"))
                })?;
                let Some(min) = min else {
                    return Err(meta.error("length requires min"));
                };
                let Some(max) = max else {
                    return Err(meta.error("length requires max"));
                };
                if min > max {
                    return Err(meta.error("length min must not exceed max"));
                }
                parsed.rules.push(Rule::Length { min, max });
                return Ok(());
            }
            if meta.path.is_ident("custom") {
                let mut with: Option<Path> = None;
                let mut message: Option<String> = None;
                meta.parse_nested_meta(|nested| {
                    if nested.path.is_ident("with") {
                        let value: LitStr = nested.value()?.parse()?;
                        with = Some(value.parse()?);
                        return Ok(());
                    }
                    if nested.path.is_ident("message") {
                        let value: LitStr = nested.value()?.parse()?;
                        message = Some(value.value());
                        return Ok(());
                    }
                    Err(nested.error("unsupported custom attribute"))
                })?;
                let Some(with) = with else {
                    return Err(meta.error("custom requires with = \"path\""));
                };
                parsed.rules.push(Rule::Custom { with, message });
                return Ok(());
            }
            Err(meta.error("unsupported valid attribute on field"))
        })?;
    }
    Ok(parsed)
}

fn expand_nested(ident: &Ident, field_name: &LitStr, is_option: bool) -> TokenStream {
    let call = quote! {
        if let ::core::result::Result::Err(failure) =
            ::model_validations_ports::TagValidate::validate_tags(value, scope)
        {
            failures.push(failure.within(#field_name));
        }
    };
    if is_option {
        quote! {
            if let ::core::option::Option::Some(value) = self.#ident.as_ref() {
                #call
            }
        }
    } else {
        quote! {
            {
                let value = &self.#ident;
                #call
            }
        }
    }
}

// Rules for one field run in a labeled block: the first failure is pushed
// and the block is left, so each field reports at most once.
fn expand_rules(ident: &Ident, field_name: &LitStr, parsed: &FieldRules) -> TokenStream {
    let presence = if parsed.required {
        quote! {
            if !::model_validations_ports::rules::is_present(value) {
                failures.push(::model_validations_ports::FieldFailure::required(#field_name).into());
                break 'rules;
            }
        }
    } else {
        quote! {
            if !::model_validations_ports::rules::is_present(value) {
                break 'rules;
            }
        }
    };

    let needs_text = parsed.rules.iter().any(|rule| {
        !matches!(
            rule,
            Rule::Custom {
                message: Some(_),
                ..
            }
        )
    });
    let text = needs_text.then(|| {
        quote! {
            let text = ::model_validations_ports::rules::text(value);
        }
    });

    let checks = parsed
        .rules
        .iter()
        .map(|rule| expand_rule(field_name, rule));

    quote! {
        'rules: {
            let value = &self.#ident;
            #presence
            #text
            #(#checks)*
        }
    }
}

fn expand_rule(field_name: &LitStr, rule: &Rule) -> TokenStream {
    let fail_as = |condition: TokenStream, rule_text: String| {
        let rule_text = LitStr::new(&rule_text, Span::call_site());
        quote! {
            if !(#condition) {
                failures.push(
                    ::model_validations_ports::FieldFailure::rule(#field_name, &text, #rule_text).into(),
                );
                break 'rules;
            }
        }
    };

    match rule {
        Rule::Length { min, max } => fail_as(
            quote! { ::model_validations_ports::rules::length(&text, #min, #max) },
            format!("length({min}|{max})"),
        ),
        Rule::Numeric => fail_as(
            quote! { ::model_validations_ports::rules::numeric(&text) },
            "numeric".to_string(),
        ),
        Rule::Email => fail_as(
            quote! { ::model_validations_ports::rules::email(&text) },
            "email".to_string(),
        ),
        Rule::Custom { with, message } => {
            let validator = with
                .segments
                .last()
                .map_or_else(|| "custom".to_string(), |segment| ident_text(&segment.ident));
            match message {
                Some(message) => {
                    let validator = LitStr::new(&validator, Span::call_site());
                    let message = LitStr::new(message, Span::call_site());
                    quote! {
                        if !#with(value, scope) {
                            failures.push(
                                ::model_validations_ports::FieldFailure::custom(
                                    #field_name,
                                    #message,
                                    #validator,
                                )
                                .into(),
                            );
                            break 'rules;
                        }
                    }
                },
                None => fail_as(quote! { #with(value, scope) }, validator),
            }
        },
    }
}
