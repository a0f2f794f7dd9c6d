use crate::{
    ident_text, named_fields, pascal_case, pluralize, snake_case, unwrap_option, wrapped_inner,
};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Attribute, DeriveInput, Ident, LitStr};

#[derive(Debug, Default)]
struct ContainerAttrs {
    table: Option<String>,
    validator: bool,
    validator_with_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Column,
    HasOne,
    HasMany,
    Skip,
}

#[derive(Debug)]
struct FieldAttrs {
    kind: FieldKind,
    primary_key: bool,
    column: Option<String>,
    foreign_key: Option<String>,
}

pub fn expand(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let container = parse_container(&input.attrs)?;
    let type_name = ident_text(&input.ident);
    let table = container
        .table
        .clone()
        .unwrap_or_else(|| pluralize(&snake_case(&type_name)));
    let default_foreign_key = format!("{}_id", snake_case(&type_name));
    let type_name = LitStr::new(&type_name, Span::call_site());
    let table = LitStr::new(&table, Span::call_site());

    let mut primary_keys = Vec::new();
    let mut id_column = None;
    let mut columns = Vec::new();
    let mut associations = Vec::new();

    for field in named_fields(input, "Model")? {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_field(&field.attrs)?;
        let column = attrs.column.clone().unwrap_or_else(|| ident_text(ident));
        let column = LitStr::new(&column, Span::call_site());
        let foreign_key = LitStr::new(
            attrs.foreign_key.as_deref().unwrap_or(&default_foreign_key),
            Span::call_site(),
        );
        if attrs.foreign_key.is_some()
            && !matches!(attrs.kind, FieldKind::HasOne | FieldKind::HasMany)
        {
            return Err(syn::Error::new_spanned(
                ident,
                "model(foreign_key) only applies to has_one and has_many",
            ));
        }

        match attrs.kind {
            FieldKind::Skip => {},
            FieldKind::Column => {
                if attrs.primary_key {
                    primary_keys.push((ident.clone(), column.clone()));
                } else if column.value() == "id" {
                    id_column = Some((ident.clone(), column.clone()));
                }
                columns.push(quote! {
                    row.insert(
                        ::std::string::String::from(#column),
                        ::model_validations_ports::column_value(&self.#ident),
                    );
                });
            },
            FieldKind::HasOne => {
                if attrs.primary_key {
                    return Err(syn::Error::new_spanned(
                        ident,
                        "an association cannot be a primary key",
                    ));
                }
                let (is_option, _) = unwrap_option(&field.ty);
                associations.push(expand_has_one(ident, &foreign_key, is_option));
            },
            FieldKind::HasMany => {
                if attrs.primary_key {
                    return Err(syn::Error::new_spanned(
                        ident,
                        "an association cannot be a primary key",
                    ));
                }
                if wrapped_inner(&field.ty, "Vec").is_none() {
                    return Err(syn::Error::new_spanned(
                        &field.ty,
                        "model(has_many) requires a Vec field",
                    ));
                }
                associations.push(expand_has_many(ident, &foreign_key));
            },
        }
    }

    if primary_keys.is_empty() {
        primary_keys.extend(id_column);
    }
    let key_calls = primary_keys.iter().map(|(ident, column)| {
        quote! {
            .with_primary_key(#column, ::model_validations_ports::column_value(&self.#ident))
        }
    });

    let associations_fn = (!associations.is_empty()).then(|| {
        quote! {
            fn associations(&self) -> ::std::vec::Vec<::model_validations_ports::Association<'_>> {
                let mut associations = ::std::vec::Vec::new();
                #(#associations)*
                associations
            }
        }
    });
    let validator_fn = container.validator.then(|| {
        quote! {
            fn validator(&self) -> ::core::option::Option<&dyn ::model_validations_ports::Validator> {
                ::core::option::Option::Some(self)
            }
        }
    });
    let validator_with_error_fn = container.validator_with_error.then(|| {
        quote! {
            fn validator_with_error(
                &self,
            ) -> ::core::option::Option<&dyn ::model_validations_ports::ValidatorWithError> {
                ::core::option::Option::Some(self)
            }
        }
    });

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::model_validations_ports::Model for #name #ty_generics #where_clause {
            fn schema(&self) -> ::model_validations_ports::ModelSchema {
                ::model_validations_ports::ModelSchema::new(#type_name, #table)
                    #(#key_calls)*
            }

            fn row(&self) -> ::model_validations_ports::Row {
                let mut row = ::model_validations_ports::Row::new();
                #(#columns)*
                row
            }

            #associations_fn
            #validator_fn
            #validator_with_error_fn
        }
    })
}

fn parse_container(attrs: &[Attribute]) -> Result<ContainerAttrs, syn::Error> {
    let mut parsed = ContainerAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("model") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                if parsed.table.is_some() {
                    return Err(meta.error("duplicate model(table = ...)"));
                }
                parsed.table = Some(value.value());
                return Ok(());
            }
            if meta.path.is_ident("validator") {
                parsed.validator = true;
                return Ok(());
            }
            if meta.path.is_ident("validator_with_error") {
                parsed.validator_with_error = true;
                return Ok(());
            }
            Err(meta.error("unsupported model attribute on container"))
        })?;
    }
    Ok(parsed)
}

fn parse_field(attrs: &[Attribute]) -> Result<FieldAttrs, syn::Error> {
    let mut kind = FieldKind::Column;
    let mut primary_key = false;
    let mut column: Option<String> = None;
    let mut foreign_key: Option<String> = None;
    for attr in attrs {
        if !attr.path().is_ident("model") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let next = if meta.path.is_ident("has_one") {
                FieldKind::HasOne
            } else if meta.path.is_ident("has_many") {
                FieldKind::HasMany
            } else if meta.path.is_ident("skip") {
                FieldKind::Skip
            } else if meta.path.is_ident("primary_key") {
                primary_key = true;
                return Ok(());
            } else if meta.path.is_ident("column") {
                let value: LitStr = meta.value()?.parse()?;
                column = Some(value.value());
                return Ok(());
            } else if meta.path.is_ident("foreign_key") {
                let value: LitStr = meta.value()?.parse()?;
                foreign_key = Some(value.value());
                return Ok(());
            } else {
                return Err(meta.error("unsupported model attribute on field"));
            };
            if kind != FieldKind::Column {
                return Err(meta.error("has_one, has_many and skip are exclusive"));
            }
            kind = next;
            Ok(())
        })?;
    }
    Ok(FieldAttrs {
        kind,
        primary_key,
        column,
        foreign_key,
    })
}

fn association_name(ident: &Ident) -> LitStr {
    LitStr::new(&pascal_case(&ident_text(ident)), Span::call_site())
}

fn expand_has_one(ident: &Ident, foreign_key: &LitStr, is_option: bool) -> TokenStream {
    let name = association_name(ident);
    if is_option {
        quote! {
            if let ::core::option::Option::Some(model) = self.#ident.as_ref() {
                associations.push(::model_validations_ports::Association::One {
                    name: #name,
                    foreign_key: #foreign_key,
                    model,
                });
            }
        }
    } else {
        quote! {
            associations.push(::model_validations_ports::Association::One {
                name: #name,
                foreign_key: #foreign_key,
                model: &self.#ident,
            });
        }
    }
}

fn expand_has_many(ident: &Ident, foreign_key: &LitStr) -> TokenStream {
    let name = association_name(ident);
    quote! {
        if !self.#ident.is_empty() {
            associations.push(::model_validations_ports::Association::Many {
                name: #name,
                foreign_key: #foreign_key,
                models: self
                    .#ident
                    .iter()
                    .map(|model| {
                        let model: &dyn ::model_validations_ports::Model = model;
                        model
                    })
                    .collect(),
            });
        }
    }
}
