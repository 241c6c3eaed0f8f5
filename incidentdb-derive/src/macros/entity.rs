//! Derive macro for `Entity`
//!
//! Generates `incidentdb::FromRow` (reading every column field through
//! `RowView::get`) and `incidentdb::Entity` (table, key columns, column list).

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

use crate::attributes::{extract_table_name, parse_column_attributes};
use crate::utils;

pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    let fields = match &input.data {
        Data::Struct(syn::DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Entity can only be derived for structs with named fields",
            ));
        }
    };

    let table_name = extract_table_name(&input.attrs)?
        .unwrap_or_else(|| utils::snake_case(&struct_name.to_string()));

    let mut initializers: Vec<TokenStream2> = Vec::new();
    let mut columns: Vec<String> = Vec::new();
    let mut key_columns: Vec<String> = Vec::new();

    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_column_attributes(field)?;

        if attrs.is_relation {
            initializers.push(quote! {
                #field_name: ::core::default::Default::default(),
            });
            continue;
        }

        let column_name = attrs
            .column_name
            .unwrap_or_else(|| utils::unraw(field_name));
        if columns.contains(&column_name) {
            return Err(syn::Error::new_spanned(
                field,
                format!("column '{column_name}' is mapped twice"),
            ));
        }
        if attrs.is_primary_key {
            key_columns.push(column_name.clone());
        }

        let column_str = column_name.as_str();
        initializers.push(quote! {
            #field_name: row.get(#column_str)?,
        });
        columns.push(column_name);
    }

    if key_columns.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Entity requires at least one #[primary_key] field",
        ));
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let table_str = table_name.as_str();

    Ok(quote! {
        impl #impl_generics ::incidentdb::FromRow for #struct_name #ty_generics #where_clause {
            fn from_row(
                row: &::incidentdb::RowView<'_>,
            ) -> ::core::result::Result<Self, ::incidentdb::MappingError> {
                ::core::result::Result::Ok(Self {
                    #(#initializers)*
                })
            }
        }

        impl #impl_generics ::incidentdb::Entity for #struct_name #ty_generics #where_clause {
            const TABLE: &'static str = #table_str;

            fn primary_key() -> ::incidentdb::Identity {
                ::incidentdb::Identity::from_columns(&[#(#key_columns),*])
            }

            fn columns() -> &'static [&'static str] {
                &[#(#columns),*]
            }
        }
    })
}
