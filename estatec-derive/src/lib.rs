use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, Meta, Type};

/// Derive macro that describes the CSV columns of a batch record.
///
/// For each named field, extracts:
/// - Column name (respects #[serde(rename = "...")])
/// - Required (false for Option<T> or fields marked #[serde(default)])
/// - Description (from doc comments)
///
/// Generates `csv_columns() -> &'static [estatec::batch::CsvColumn]` and
/// `csv_header() -> Vec<&'static str>`.
#[proc_macro_derive(CsvColumns, attributes(serde))]
pub fn derive_csv_columns(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(name, "CsvColumns needs named fields")
                    .to_compile_error()
                    .into()
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "CsvColumns only supports structs")
                .to_compile_error()
                .into()
        }
    };

    let columns: Vec<_> = fields
        .iter()
        .filter_map(|field| {
            let ident = field.ident.as_ref()?;
            let serde_args = serde_args(&field.attrs);
            let column = rename_of(&serde_args).unwrap_or_else(|| ident.to_string());
            let optional = is_option_type(&field.ty) || has_default(&serde_args);
            let doc = doc_comment(&field.attrs);
            Some((column, !optional, doc))
        })
        .collect();

    let entries = columns.iter().map(|(column, required, doc)| {
        quote! {
            CsvColumn {
                name: #column,
                required: #required,
                description: #doc,
            }
        }
    });
    let names = columns.iter().map(|(column, _, _)| column);

    let expanded = quote! {
        impl #name {
            pub fn csv_columns() -> &'static [crate::batch::CsvColumn] {
                use crate::batch::CsvColumn;
                static COLUMNS: &[CsvColumn] = &[
                    #(#entries),*
                ];
                COLUMNS
            }

            pub fn csv_header() -> Vec<&'static str> {
                vec![#(#names),*]
            }
        }
    };

    TokenStream::from(expanded)
}

/// Flattened token text of every `#[serde(...)]` attribute on a field.
fn serde_args(attrs: &[syn::Attribute]) -> Vec<String> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident("serde"))
        .filter_map(|attr| match &attr.meta {
            Meta::List(list) => Some(list.tokens.to_string()),
            _ => None,
        })
        .collect()
}

fn rename_of(serde_args: &[String]) -> Option<String> {
    serde_args.iter().find_map(|tokens| {
        let start = tokens.find("rename")?;
        let rest = &tokens[start..];
        let after_eq = rest[rest.find('=')? + 1..].trim();
        let quoted = after_eq.strip_prefix('"')?;
        let end = quoted.find('"')?;
        Some(quoted[..end].to_string())
    })
}

fn has_default(serde_args: &[String]) -> bool {
    serde_args.iter().any(|tokens| {
        tokens
            .split(',')
            .any(|arg| arg.trim().split('=').next().map(str::trim) == Some("default"))
    })
}

fn doc_comment(attrs: &[syn::Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if !attr.path().is_ident("doc") {
                return None;
            }
            if let Meta::NameValue(meta) = &attr.meta {
                if let syn::Expr::Lit(expr_lit) = &meta.value {
                    if let Lit::Str(lit_str) = &expr_lit.lit {
                        return Some(lit_str.value().trim().to_string());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}
