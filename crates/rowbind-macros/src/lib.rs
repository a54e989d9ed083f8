use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, LitStr, parse_macro_input};

/// Marker that excludes a field from binding.
const SKIP: &str = "-";

/* ─────────────────────────── the derive macro ─────────────────────────── */

/// Implements `rowbind::FromRow` for a struct with named fields.
///
/// Each field annotated with `#[csv("...")]` is bound in declaration
/// order. Fields without the attribute, or with `""` / `"-"`, are left
/// untouched and need not implement `FromField`.
#[proc_macro_derive(FromRow, attributes(csv))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    /* -------- 1 · only named-field structs -------- */
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "FromRow can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "FromRow can only be derived for structs",
            ));
        }
    };

    /* -------- 2 · collect bound fields -------- */
    let mut descriptors = Vec::new();
    let mut binds = Vec::new();
    for field in fields {
        let Some(tag) = field_tag(field)? else {
            continue;
        };
        if tag.is_empty() || tag == SKIP {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let name = ident.to_string();
        let name = name.strip_prefix("r#").unwrap_or(&name).to_string();
        let slot = descriptors.len();

        descriptors.push(quote! { ::rowbind::FieldDescriptor::new(#name, #tag) });
        binds.push(quote! { binder.bind(#slot, &mut self.#ident)?; });
    }

    /* -------- 3 · assemble the impl -------- */
    let ident = &input.ident;
    let body = if binds.is_empty() {
        quote! { let _ = row; }
    } else {
        quote! {
            let binder = ::rowbind::FieldBinder::new(
                row,
                <Self as ::rowbind::FromRow>::fields(),
                <Self as ::rowbind::FromRow>::directives(),
            );
            #(#binds)*
        }
    };
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::rowbind::FromRow for #ident #ty_generics #where_clause {
            fn fields() -> &'static [::rowbind::FieldDescriptor] {
                const FIELDS: &[::rowbind::FieldDescriptor] = &[ #(#descriptors),* ];
                FIELDS
            }

            fn directives() -> &'static ::rowbind::DirectiveTable {
                static DIRECTIVES: ::std::sync::OnceLock<::rowbind::DirectiveTable> =
                    ::std::sync::OnceLock::new();
                DIRECTIVES.get_or_init(|| {
                    ::rowbind::DirectiveTable::from_fields(
                        <Self as ::rowbind::FromRow>::fields(),
                    )
                })
            }

            fn bind_row(
                &mut self,
                row: &::rowbind::RowContext,
            ) -> ::core::result::Result<(), ::rowbind::BindError> {
                #body
                ::core::result::Result::Ok(())
            }
        }
    })
}

/// The string inside `#[csv("...")]`, if the field carries one.
fn field_tag(field: &Field) -> syn::Result<Option<String>> {
    let mut tag = None;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("csv")) {
        if tag.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate #[csv] attribute"));
        }
        let lit: LitStr = attr.parse_args()?;
        tag = Some(lit.value());
    }
    Ok(tag)
}
