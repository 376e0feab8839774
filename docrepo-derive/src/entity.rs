use crate::convertible::{field_key, field_options, named_fields};
use proc_macro::TokenStream;
use quote::quote;
use syn::{DataStruct, DeriveInput, Field, LitStr, Result};

pub(crate) fn generate_entity_for_struct(ast: &DeriveInput, data: &DataStruct) -> Result<TokenStream> {
    let name = &ast.ident;

    if !ast.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast.generics,
            format!("Cannot derive Entity for generic type '{}'", name),
        ));
    }

    let mut entity_name = name.to_string();
    let mut entity_id: Option<String> = None;

    for attr in &ast.attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    entity_name = s.value();
                    Ok(())
                } else if meta.path.is_ident("id") {
                    if entity_id.is_some() {
                        return Err(meta.error("Multiple id attributes are not allowed"));
                    }
                    meta.parse_nested_meta(|meta| {
                        if meta.path.is_ident("field") {
                            let value = meta.value()?;
                            let s: LitStr = value.parse()?;
                            entity_id = Some(s.value());
                            Ok(())
                        } else {
                            Err(meta.error("Unknown id attribute, expected `field`"))
                        }
                    })
                } else {
                    Err(meta.error("Unknown entity attribute"))
                }
            })?
        }
    }

    let fields = named_fields(ast, data)?;
    let id_field = find_id_field(ast, &fields, entity_id)?;

    let mut field_defs = Vec::with_capacity(fields.len());
    for field in &fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let options = field_options(field)?;
        if options.ignored {
            continue;
        }

        let key = field_key(ident);
        let ty = &field.ty;
        let required = if options.default {
            quote! { false }
        } else {
            quote! { !<#ty as docrepo::common::Convertible>::is_optional() }
        };
        field_defs.push(quote! {
            docrepo::common::FieldDef::new(
                #key,
                <#ty as docrepo::common::Convertible>::field_kind(),
                #required,
            )
        });
    }

    let (id_code, model_code) = match id_field {
        Some(field) => {
            if field_options(field)?.ignored {
                return Err(syn::Error::new_spanned(
                    field,
                    "The identifier field cannot be ignored",
                ));
            }

            let Some(ident) = field.ident.as_ref() else {
                return Err(syn::Error::new_spanned(field, "The identifier field must be named"));
            };
            let key = field_key(ident);
            let ty = &field.ty;
            let id_code = quote! {
                Some(docrepo::common::IdField::new(
                    #key,
                    <<#ty as docrepo::repository::IdSlot>::Id as docrepo::repository::ModelId>::REPR,
                    <#ty as docrepo::repository::IdSlot>::REQUIRED,
                ))
            };
            let model_code = quote! {
                impl docrepo::repository::Model for #name {
                    type Id = <#ty as docrepo::repository::IdSlot>::Id;

                    fn id(&self) -> Option<&Self::Id> {
                        docrepo::repository::IdSlot::get(&self.#ident)
                    }

                    fn set_id(&mut self, id: Self::Id) {
                        docrepo::repository::IdSlot::set(&mut self.#ident, id)
                    }
                }
            };
            (id_code, model_code)
        }
        None => (quote! { None }, quote! {}),
    };

    let gen = quote! {
        impl docrepo::repository::Entity for #name {
            fn schema() -> &'static docrepo::common::Schema {
                static SCHEMA: ::std::sync::OnceLock<docrepo::common::Schema> = ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    docrepo::common::Schema::new(
                        #entity_name,
                        vec![#(#field_defs),*],
                        #id_code,
                    )
                })
            }
        }

        #model_code
    };

    Ok(TokenStream::from(gen))
}

/// Resolves the identifier field: the one named by `#[entity(id(field))]`,
/// else one marked `#[entity(id)]`, else one named `id`.
fn find_id_field<'a>(
    ast: &DeriveInput,
    fields: &[&'a Field],
    entity_id: Option<String>,
) -> Result<Option<&'a Field>> {
    let by_name = |name: &str| {
        fields
            .iter()
            .copied()
            .find(|field| field.ident.as_ref().is_some_and(|ident| field_key(ident) == name))
    };

    if let Some(id_name) = entity_id {
        return match by_name(&id_name) {
            Some(field) => Ok(Some(field)),
            None => Err(syn::Error::new_spanned(
                ast,
                format!("Field {} not found in struct", id_name),
            )),
        };
    }

    let mut marked = None;
    for field in fields {
        for attr in &field.attrs {
            if attr.path().is_ident("entity") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("id") {
                        Ok(())
                    } else {
                        Err(meta.error("Unknown field attribute, expected `id`"))
                    }
                })?;
                if marked.is_some() {
                    return Err(syn::Error::new_spanned(
                        attr,
                        "Multiple id attributes are not allowed",
                    ));
                }
                marked = Some(*field);
            }
        }
    }

    Ok(marked.or_else(|| by_name("id")))
}
