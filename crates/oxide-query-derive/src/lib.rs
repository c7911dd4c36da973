//! Derive macros for oxide-query record schemas.
//!
//! This crate provides the `#[derive(Record)]` macro, which declares how a
//! struct maps onto a table and generates typed field accessors for
//! building expressions.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, Meta, Type};

/// Derives `Record` and `Insertable` for a struct with named fields.
///
/// # Attributes
///
/// - `#[record(table = "Users")]` - The table name (optional, defaults to
///   the struct name)
/// - `#[record(schema = "dbo")]` - The schema/namespace prefix of the table
/// - `#[record(rename_all = "PascalCase")]` - Derives column names from
///   field names (`user_id` becomes `UserId`); `"snake_case"` keeps them
///
/// # Field Attributes
///
/// - `#[column(name = "EmailAddress")]` - Overrides the column name
/// - `#[column(key)]` - Marks the key field; without it a field named `id`
///   is the key
///
/// # Generated Items
///
/// For a struct `User`, this macro generates:
///
/// - `impl Record for User`, whose `NAME` is `"User"`
/// - `impl Insertable for User`, producing every non-key field as a payload
///   member (field types must be `Clone + ToSqlValue`)
/// - One `const fn <field>() -> Field<User>` accessor per field
#[proc_macro_derive(Record, attributes(record, column))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_record_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_record_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let record_attrs = parse_record_attrs(&input.attrs)?;
    let record_name = struct_name.to_string();
    let table_name = record_attrs.table.unwrap_or_else(|| record_name.clone());

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Record derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Record derive only supports structs",
            ));
        }
    };

    let mut field_infos: Vec<FieldInfo> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let column_attrs = parse_column_attrs(&field.attrs)?;
        let column_name = column_attrs
            .name
            .unwrap_or_else(|| record_attrs.rename.apply(&field_name.to_string()));

        field_infos.push(FieldInfo {
            field_name,
            field_type: field.ty.clone(),
            column_name,
            is_key: column_attrs.key,
        });
    }

    // Without an explicit marker the field named `id` is the key.
    if !field_infos.iter().any(|f| f.is_key) {
        if let Some(id) = field_infos
            .iter_mut()
            .find(|f| f.field_name.to_string().eq_ignore_ascii_case("id"))
        {
            id.is_key = true;
        }
    }

    let namespace = record_attrs.schema.map(|ns| {
        quote! { .with_namespace(#ns) }
    });

    let schema_entries: Vec<TokenStream2> = field_infos
        .iter()
        .map(|info| {
            let name = info.field_name.to_string();
            let column = &info.column_name;
            let field_type = &info.field_type;
            let rust_type = quote!(#field_type).to_string().replace(' ', "");
            let key = info.is_key.then(|| quote! { .key() });
            quote! {
                .with_field(
                    ::oxide_query_core::schema::FieldSchema::new(#name)
                        .with_column(#column)
                        .with_type(#rust_type)
                        #key
                )
            }
        })
        .collect();

    let members: Vec<TokenStream2> = field_infos
        .iter()
        .filter(|info| !info.is_key)
        .map(|info| {
            let ident = &info.field_name;
            let name = ident.to_string();
            quote! {
                .member(
                    #name,
                    ::oxide_query_core::expr::Expr::value(
                        ::core::clone::Clone::clone(&self.#ident)
                    )
                )
            }
        })
        .collect();

    let accessors: Vec<TokenStream2> = field_infos
        .iter()
        .map(|info| {
            let ident = &info.field_name;
            let name = ident.to_string();
            quote! {
                /// Returns the typed field for building expressions.
                #[inline]
                #[must_use]
                pub const fn #ident() -> ::oxide_query_core::expr::Field<Self> {
                    ::oxide_query_core::expr::Field::new(#name)
                }
            }
        })
        .collect();

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::oxide_query_core::schema::Record for #struct_name #ty_generics
            #where_clause
        {
            const NAME: &'static str = #record_name;

            fn schema() -> ::oxide_query_core::schema::RecordSchema {
                ::oxide_query_core::schema::RecordSchema::new(#record_name, #table_name)
                    #namespace
                    #(#schema_entries)*
            }
        }

        impl #impl_generics ::oxide_query_core::schema::Insertable for #struct_name #ty_generics
            #where_clause
        {
            fn to_object(&self) -> ::oxide_query_core::expr::ObjectExpr {
                ::oxide_query_core::expr::ObjectExpr::for_record(#record_name)
                    #(#members)*
            }
        }

        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#accessors)*
        }
    })
}

struct FieldInfo {
    field_name: Ident,
    field_type: Type,
    column_name: String,
    is_key: bool,
}

#[derive(Default)]
struct RecordAttrs {
    table: Option<String>,
    schema: Option<String>,
    rename: Rename,
}

#[derive(Default, Clone, Copy)]
enum Rename {
    #[default]
    None,
    PascalCase,
}

impl Rename {
    fn apply(self, field: &str) -> String {
        match self {
            Self::None => field.to_string(),
            Self::PascalCase => to_pascal_case(field),
        }
    }
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    key: bool,
}

fn string_value(value: &Expr) -> Option<String> {
    match value {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => Some(s.value()),
            _ => None,
        },
        _ => None,
    }
}

fn parse_record_attrs(attrs: &[Attribute]) -> syn::Result<RecordAttrs> {
    let mut result = RecordAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let value: Expr = meta.value()?.parse()?;
            let Some(text) = string_value(&value) else {
                return Err(meta.error("expected a string literal"));
            };
            if meta.path.is_ident("table") {
                result.table = Some(text);
            } else if meta.path.is_ident("schema") {
                result.schema = Some(text);
            } else if meta.path.is_ident("rename_all") {
                result.rename = match text.as_str() {
                    "PascalCase" => Rename::PascalCase,
                    "snake_case" | "none" => Rename::None,
                    _ => return Err(meta.error("rename_all must be \"PascalCase\" or \"snake_case\"")),
                };
            } else {
                return Err(meta.error("unknown record attribute"));
            }
            Ok(())
        })?;
    }
    Ok(result)
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("key") || meta.path.is_ident("primary_key") {
                    result.key = true;
                } else if meta.path.is_ident("name") {
                    let value: Expr = meta.value()?.parse()?;
                    result.name = string_value(&value);
                    if result.name.is_none() {
                        return Err(meta.error("expected a string literal"));
                    }
                } else {
                    return Err(meta.error("unknown column attribute"));
                }
                Ok(())
            })?;
        }
    }

    Ok(result)
}

fn to_pascal_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = true;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}
