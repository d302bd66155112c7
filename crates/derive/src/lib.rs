use proc_macro2::Span;
use quote::{quote, quote_spanned};
use syn::{DeriveInput, LitStr, parse_macro_input, spanned::Spanned};

/// Derives `nectargl::Uniforms` for a struct with named fields.
///
/// Every field is written under its own name, or under `#[uniform(rename = "...")]`.
/// Field types must implement `nectargl::UniformField`.
#[proc_macro_derive(Uniforms, attributes(uniform))]
pub fn derive_uniforms(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let str = match input.data {
        syn::Data::Struct(s) => s,
        _ => {
            return quote_spanned! {
                Span::call_site() =>
                compile_error!("Uniforms can only be derived for struct types");
            }
            .into();
        }
    };

    let fields = match str.fields {
        syn::Fields::Named(fields) => fields.named,
        syn::Fields::Unit => Default::default(),
        syn::Fields::Unnamed(fields) => {
            return quote_spanned! {
                fields.span() =>
                compile_error!("Uniforms needs named fields, uniform block members are addressed by name");
            }
            .into();
        }
    };

    let mut writes = Vec::with_capacity(fields.len());
    for field in &fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };

        let mut uniform_name = ident.to_string();
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("uniform")) {
            let parsed = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    uniform_name = value.value();
                    Ok(())
                } else {
                    Err(meta.error("expected `rename = \"...\"`"))
                }
            });

            if let Err(error) = parsed {
                return error.to_compile_error().into();
            }
        }

        writes.push(quote! {
            writer.write_uniform(#uniform_name, nectargl::UniformField::uniform_value(&self.#ident));
        });
    }

    quote! {
        impl #impl_generics nectargl::Uniforms for #name #ty_generics #where_clause {
            fn write_uniforms(&self, writer: &mut dyn nectargl::UniformWriter) {
                let _ = &writer;
                #(#writes)*
            }
        }
    }
    .into()
}
