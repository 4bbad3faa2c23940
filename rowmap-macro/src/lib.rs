//! rowmap Procedural Macros
//!
//! `#[derive(Record)]` turns `#[db("...")]` field tags into the column list
//! of `rowmap::Record`. Tags are checked at compile time.
//!
//! ```ignore
//! #[derive(Default, Record)]
//! struct Post {
//!     #[db("id,pk")]
//!     id: i64,
//!     #[db("title")]
//!     title: String,
//!     #[db("body,serialize")]
//!     body: Vec<String>,
//!     draft: bool, // untagged, not mapped
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

/// Derive `rowmap::Record` from `#[db("name[,pk][,serialize]")]` field tags.
#[proc_macro_derive(Record, attributes(db))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_record(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_record(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new(
                    input.span(),
                    "#[derive(Record)] needs a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "#[derive(Record)] can only be applied to structs",
            ));
        }
    };

    let mut columns = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let mut tags = field.attrs.iter().filter(|attr| attr.path().is_ident("db"));
        let Some(attr) = tags.next() else {
            continue;
        };
        if let Some(extra) = tags.next() {
            return Err(syn::Error::new(extra.span(), "field has more than one #[db] tag"));
        }

        let lit: LitStr = attr.parse_args()?;
        let tag = parse_tag(&lit.value()).map_err(|msg| syn::Error::new(lit.span(), msg))?;

        let field_ident = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new(field.span(), "#[db] needs a named field")
        })?;
        let name = &tag.name;
        let constructor = if tag.serialize {
            quote!(serialized)
        } else {
            quote!(new)
        };
        let primary_key = tag.primary_key.then(|| quote!(.primary_key()));

        columns.push(quote! {
            ::rowmap::Column::#constructor(
                #name,
                |r: &Self| &r.#field_ident,
                |r: &mut Self| &mut r.#field_ident,
            )
            #primary_key
            .at(#index)
        });
    }

    Ok(quote! {
        impl #impl_generics ::rowmap::Record for #ident #ty_generics #where_clause {
            fn columns() -> ::std::vec::Vec<::rowmap::Column<Self>> {
                ::std::vec![#(#columns),*]
            }
        }
    })
}

/// A parsed `#[db]` tag.
#[derive(Debug, PartialEq)]
struct Tag {
    name: String,
    primary_key: bool,
    serialize: bool,
}

/// Parse `name[,pk][,serialize]`. Keywords may appear in any position; the
/// first other token is the column name.
fn parse_tag(tag: &str) -> Result<Tag, String> {
    let mut name: Option<&str> = None;
    let mut primary_key = false;
    let mut serialize = false;

    for token in tag.split(',').map(str::trim) {
        match token {
            "" => return Err(format!("empty entry in tag \"{}\"", tag)),
            "pk" if primary_key => return Err("`pk` given twice".to_string()),
            "pk" => primary_key = true,
            "serialize" if serialize => return Err("`serialize` given twice".to_string()),
            "serialize" => serialize = true,
            other if other.contains(char::is_whitespace) => {
                return Err(format!("column name `{}` contains whitespace", other));
            }
            other => match name {
                Some(existing) => {
                    return Err(format!(
                        "unexpected `{}`: column name is already `{}` (flags are `pk` and `serialize`)",
                        other, existing
                    ));
                }
                None => name = Some(other),
            },
        }
    }

    let name = name.ok_or_else(|| format!("tag \"{}\" has no column name", tag))?;
    Ok(Tag {
        name: name.to_string(),
        primary_key,
        serialize,
    })
}
