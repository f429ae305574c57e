use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, LitStr, parse_macro_input};

/// Derives `regform::form::FormModel` for a struct with named fields.
///
/// Every field gets a zero-sized lens type and a key. The key defaults to the
/// field name and can be overridden with `#[form(rename = "...")]`. Field
/// types must implement `regform::form::FieldData`.
#[proc_macro_derive(FormModel, attributes(form))]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        ));
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return Err(syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            ));
        }
    };

    let regform = regform_path();
    let mut lens_defs = Vec::new();
    let mut fields_methods = Vec::new();
    let mut key_literals = Vec::new();
    let mut get_arms = Vec::new();
    let mut set_arms = Vec::new();

    for field in named_fields {
        let key = field_key(&field)?;
        let Some(field_ident) = field.ident else {
            continue;
        };
        let field_ty = field.ty;
        let key = key.unwrap_or_else(|| field_ident.to_string());
        let lens_ident = format_ident!(
            "{model_ident}{}Lens",
            to_pascal_case(&field_ident.to_string())
        );

        lens_defs.push(quote! {
            #[derive(Clone, Copy, Debug, Default)]
            pub struct #lens_ident;

            impl #regform::form::FieldLens<#model_ident> for #lens_ident {
                type Value = #field_ty;

                fn key(self) -> #regform::form::FieldKey {
                    #regform::form::FieldKey::new(#key)
                }

                fn get<'a>(self, model: &'a #model_ident) -> &'a Self::Value {
                    &model.#field_ident
                }

                fn set(self, model: &mut #model_ident, value: Self::Value) {
                    model.#field_ident = value;
                }
            }
        });

        fields_methods.push(quote! {
            pub const fn #field_ident(&self) -> #lens_ident {
                #lens_ident
            }
        });

        key_literals.push(quote! { #regform::form::FieldKey::new(#key) });

        get_arms.push(quote! {
            #key => ::core::option::Option::Some(
                #regform::form::FieldData::to_field_value(&self.#field_ident)
            ),
        });

        set_arms.push(quote! {
            #key => {
                self.#field_ident =
                    <#field_ty as #regform::form::FieldData>::from_field_value(key, value)?;
                ::core::result::Result::Ok(())
            }
        });
    }

    Ok(quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#fields_methods)*
        }

        impl #regform::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            const FIELD_KEYS: &'static [#regform::form::FieldKey] = &[#(#key_literals),*];

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn field_value(
                &self,
                key: #regform::form::FieldKey,
            ) -> ::core::option::Option<#regform::form::FieldValue> {
                match key.as_str() {
                    #(#get_arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_field_value(
                &mut self,
                key: #regform::form::FieldKey,
                value: #regform::form::FieldValue,
            ) -> ::core::result::Result<(), #regform::form::FieldValueError> {
                match key.as_str() {
                    #(#set_arms)*
                    _ => ::core::result::Result::Err(
                        #regform::form::FieldValueError::UnknownField(key.to_string())
                    ),
                }
            }
        }

        #(#lens_defs)*
    })
}

fn field_key(field: &Field) -> syn::Result<Option<String>> {
    let mut rename = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("form") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported form attribute, expected `rename`"))
            }
        })?;
    }
    Ok(rename)
}

fn regform_path() -> TokenStream2 {
    match crate_name("regform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::regform),
    }
}

fn to_pascal_case(input: &str) -> String {
    let mut out = String::new();
    for segment in input.split('_') {
        if segment.is_empty() {
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
