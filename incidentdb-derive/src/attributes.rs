//! Attribute parsing utilities

use syn::{Attribute, ExprLit, Field, Lit};

/// String value of a `#[name = "value"]` attribute.
fn name_value_str(attr: &Attribute) -> syn::Result<String> {
    let meta = attr.meta.require_name_value()?;
    match &meta.value {
        syn::Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

/// Extract table name from struct attributes
pub fn extract_table_name(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    for attr in attrs {
        if attr.path().is_ident("table_name") {
            return name_value_str(attr).map(Some);
        }
    }
    Ok(None)
}

/// Column-level attributes of one field
#[derive(Debug, Default)]
pub struct ColumnAttributes {
    pub is_primary_key: bool,
    pub column_name: Option<String>,
    pub is_relation: bool,
}

/// Parse all column attributes from a field
pub fn parse_column_attributes(field: &Field) -> syn::Result<ColumnAttributes> {
    let mut attrs = ColumnAttributes::default();

    for attr in &field.attrs {
        if attr.path().is_ident("primary_key") {
            attr.meta.require_path_only()?;
            attrs.is_primary_key = true;
        } else if attr.path().is_ident("column_name") {
            attrs.column_name = Some(name_value_str(attr)?);
        } else if attr.path().is_ident("relation") {
            attr.meta.require_path_only()?;
            attrs.is_relation = true;
        }
    }

    if attrs.is_relation && (attrs.is_primary_key || attrs.column_name.is_some()) {
        return Err(syn::Error::new_spanned(
            field,
            "a #[relation] field cannot also be a column",
        ));
    }

    Ok(attrs)
}
