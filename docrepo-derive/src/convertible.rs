use proc_macro::TokenStream;
use proc_macro2::{Ident, Span};
use quote::quote;
use syn::ext::IdentExt;
use syn::{DataEnum, DataStruct, DeriveInput, Field, Fields, Result};

/// Options set on a field with `#[converter(...)]`.
#[derive(Default)]
pub(crate) struct FieldOptions {
    pub(crate) ignored: bool,
    pub(crate) default: bool,
}

pub(crate) fn field_options(field: &Field) -> Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in &field.attrs {
        if attr.path().is_ident("converter") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("ignored") {
                    options.ignored = true;
                    Ok(())
                } else if meta.path.is_ident("default") {
                    options.default = true;
                    Ok(())
                } else {
                    Err(meta.error("Unknown converter attribute, expected `ignored` or `default`"))
                }
            })?;
        }
    }
    Ok(options)
}

/// The named fields of a struct, or an error spanning the struct.
pub(crate) fn named_fields<'a>(ast: &DeriveInput, data: &'a DataStruct) -> Result<Vec<&'a Field>> {
    match &data.fields {
        Fields::Named(fields) => Ok(fields.named.iter().collect()),
        _ => Err(syn::Error::new_spanned(
            ast,
            format!("'{}' must have named fields", ast.ident),
        )),
    }
}

/// The document key of a field, without a raw identifier prefix.
pub(crate) fn field_key(ident: &Ident) -> String {
    ident.unraw().to_string()
}

pub(crate) fn generate_convertible_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &ast.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let fields = named_fields(ast, data)?;
    let mut to_value_entries = Vec::with_capacity(fields.len());
    let mut initializers = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let key = field_key(ident);
        let ty = &field.ty;
        let options = field_options(field)?;

        if options.ignored {
            initializers.push(quote! { #ident: ::core::default::Default::default() });
            continue;
        }

        to_value_entries.push(quote! {
            doc.insert(
                #key,
                docrepo::common::Convertible::to_value(&self.#ident).map_err(|err| err.within(#key))?,
            );
        });

        if options.default {
            initializers.push(quote! { #ident: docrepo::common::read_field_or_default::<#ty>(doc, #key)? });
        } else {
            initializers.push(quote! { #ident: docrepo::common::read_field::<#ty>(doc, #key)? });
        }
    }

    // generic structs cannot have a per type schema
    let field_kind = if ast.generics.params.is_empty() {
        quote! {
            fn field_kind() -> docrepo::common::FieldKind {
                docrepo::common::FieldKind::Embedded(<Self as docrepo::repository::Entity>::schema)
            }
        }
    } else {
        quote! {}
    };

    let gen = quote! {
        impl #impl_generics docrepo::common::Convertible for #name #ty_generics #where_clause {
            type Output = Self;

            fn to_value(&self) -> docrepo::errors::RepoResult<docrepo::common::Value> {
                let mut doc = docrepo::collection::Document::new();
                #(#to_value_entries)*
                Ok(docrepo::common::Value::Document(doc))
            }

            fn from_value(value: &docrepo::common::Value) -> docrepo::errors::RepoResult<Self::Output> {
                match value {
                    docrepo::common::Value::Document(doc) => Ok(#name {
                        #(#initializers,)*
                    }),
                    other => Err(docrepo::errors::RepoError::new(
                        &format!("Expected a document for {} but found {}", #type_name, other.type_name()),
                        docrepo::errors::ErrorKind::MappingError,
                    )),
                }
            }

            #field_kind
        }
    };

    Ok(TokenStream::from(gen))
}

pub(crate) fn generate_convertible_for_enum(ast: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
    let all_unit = data
        .variants
        .iter()
        .all(|variant| matches!(variant.fields, Fields::Unit));

    if all_unit {
        generate_for_unit_enum(ast, data)
    } else {
        generate_for_data_enum(ast, data)
    }
}

// unit variants convert to their name
fn generate_for_unit_enum(ast: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
    let name = &ast.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let idents: Vec<&Ident> = data.variants.iter().map(|variant| &variant.ident).collect();
    let keys: Vec<String> = idents.iter().map(|ident| field_key(ident)).collect();

    let gen = quote! {
        impl #impl_generics docrepo::common::Convertible for #name #ty_generics #where_clause {
            type Output = Self;

            fn to_value(&self) -> docrepo::errors::RepoResult<docrepo::common::Value> {
                match *self {
                    #(#name::#idents => Ok(docrepo::common::Value::String(#keys.to_string())),)*
                }
            }

            fn from_value(value: &docrepo::common::Value) -> docrepo::errors::RepoResult<Self::Output> {
                match value {
                    docrepo::common::Value::String(variant) => match variant.as_str() {
                        #(#keys => Ok(#name::#idents),)*
                        other => Err(docrepo::errors::RepoError::new(
                            &format!("Unknown variant '{}' of {}", other, #type_name),
                            docrepo::errors::ErrorKind::MappingError,
                        )),
                    },
                    other => Err(docrepo::errors::RepoError::new(
                        &format!("Expected a string for {} but found {}", #type_name, other.type_name()),
                        docrepo::errors::ErrorKind::MappingError,
                    )),
                }
            }
        }
    };

    Ok(TokenStream::from(gen))
}

// other enums convert to {variant: name, value: fields}
fn generate_for_data_enum(ast: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
    let name = &ast.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut to_value_variants = Vec::with_capacity(data.variants.len());
    let mut from_value_variants = Vec::with_capacity(data.variants.len());

    for variant in &data.variants {
        let variant_ident = &variant.ident;
        let variant_name = field_key(variant_ident);

        match &variant.fields {
            Fields::Named(fields) => {
                let mut bound = Vec::new();
                let mut keys = Vec::new();
                let mut initializers = Vec::new();

                for field in &fields.named {
                    let Some(ident) = field.ident.as_ref() else {
                        continue;
                    };
                    let key = field_key(ident);
                    let ty = &field.ty;
                    let options = field_options(field)?;

                    if options.ignored {
                        initializers.push(quote! { #ident: ::core::default::Default::default() });
                    } else {
                        if options.default {
                            initializers
                                .push(quote! { #ident: docrepo::common::read_field_or_default::<#ty>(fields, #key)? });
                        } else {
                            initializers.push(quote! { #ident: docrepo::common::read_field::<#ty>(fields, #key)? });
                        }
                        bound.push(ident);
                        keys.push(key);
                    }
                }

                to_value_variants.push(quote! {
                    #name::#variant_ident { #(ref #bound,)* .. } => {
                        let mut fields = docrepo::collection::Document::new();
                        #(fields.insert(
                            #keys,
                            docrepo::common::Convertible::to_value(#bound).map_err(|err| err.within(#keys))?,
                        );)*
                        (#variant_name, docrepo::common::Value::Document(fields))
                    }
                });

                from_value_variants.push(quote! {
                    #variant_name => match data {
                        docrepo::common::Value::Document(fields) => Ok(#name::#variant_ident {
                            #(#initializers,)*
                        }),
                        other => Err(docrepo::errors::RepoError::new(
                            &format!("Expected a document for {}::{} but found {}", #type_name, #variant_name, other.type_name()),
                            docrepo::errors::ErrorKind::MappingError,
                        )),
                    }
                });
            }
            Fields::Unnamed(fields) => {
                let field_count = fields.unnamed.len();
                let bound: Vec<Ident> = (0..field_count)
                    .map(|i| Ident::new(&format!("field_{}", i), Span::call_site()))
                    .collect();
                let indices: Vec<usize> = (0..field_count).collect();
                let positions: Vec<String> = indices.iter().map(|i| i.to_string()).collect();
                let types: Vec<_> = fields.unnamed.iter().map(|field| &field.ty).collect();

                to_value_variants.push(quote! {
                    #name::#variant_ident(#(ref #bound),*) => {
                        let mut items = Vec::with_capacity(#field_count);
                        #(items.push(
                            docrepo::common::Convertible::to_value(#bound).map_err(|err| err.within(#positions))?,
                        );)*
                        (#variant_name, docrepo::common::Value::Array(items))
                    }
                });

                from_value_variants.push(quote! {
                    #variant_name => match data {
                        docrepo::common::Value::Array(items) if items.len() == #field_count => Ok(#name::#variant_ident(
                            #(docrepo::common::from_value::<#types>(&items[#indices])
                                .map_err(|err| err.within(#positions))?,)*
                        )),
                        other => Err(docrepo::errors::RepoError::new(
                            &format!("Expected {} values for {}::{} but found {}", #field_count, #type_name, #variant_name, other),
                            docrepo::errors::ErrorKind::MappingError,
                        )),
                    }
                });
            }
            Fields::Unit => {
                to_value_variants.push(quote! {
                    #name::#variant_ident => (#variant_name, docrepo::common::Value::Null)
                });

                from_value_variants.push(quote! {
                    #variant_name => Ok(#name::#variant_ident)
                });
            }
        }
    }

    let gen = quote! {
        impl #impl_generics docrepo::common::Convertible for #name #ty_generics #where_clause {
            type Output = Self;

            fn to_value(&self) -> docrepo::errors::RepoResult<docrepo::common::Value> {
                let (variant, value) = match *self {
                    #(#to_value_variants,)*
                };
                let mut doc = docrepo::collection::Document::new();
                doc.insert("variant", docrepo::common::Value::String(variant.to_string()));
                doc.insert("value", value);
                Ok(docrepo::common::Value::Document(doc))
            }

            fn from_value(value: &docrepo::common::Value) -> docrepo::errors::RepoResult<Self::Output> {
                let doc = match value {
                    docrepo::common::Value::Document(doc) => doc,
                    other => {
                        return Err(docrepo::errors::RepoError::new(
                            &format!("Expected a document for {} but found {}", #type_name, other.type_name()),
                            docrepo::errors::ErrorKind::MappingError,
                        ))
                    }
                };

                let null = docrepo::common::Value::Null;
                let data = doc.get_key("value").unwrap_or(&null);
                match doc.get_key("variant") {
                    Some(docrepo::common::Value::String(variant)) => match variant.as_str() {
                        #(#from_value_variants,)*
                        other => Err(docrepo::errors::RepoError::new(
                            &format!("Unknown variant '{}' of {}", other, #type_name),
                            docrepo::errors::ErrorKind::MappingError,
                        )),
                    },
                    _ => Err(docrepo::errors::RepoError::new(
                        &format!("Missing variant name for {}", #type_name),
                        docrepo::errors::ErrorKind::MappingError,
                    )),
                }
            }
        }
    };

    Ok(TokenStream::from(gen))
}
