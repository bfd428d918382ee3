use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, GenericArgument, Ident, LitStr, PathArguments, Type};

enum FieldKind {
  Attribute,
  HasOne,
  HasMany,
  Skip,
}

struct ResourceField {
  ident: Ident,
  kind: FieldKind,
  optional: bool,
}

#[proc_macro_derive(Resource, attributes(resource))]
pub fn derive_resource(input: TokenStream) -> TokenStream {
  let input = parse_macro_input!(input as DeriveInput);
  match expand(&input) {
    Ok(expanded) => TokenStream::from(expanded),
    Err(error) => TokenStream::from(error.to_compile_error()),
  }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
  let name = &input.ident;
  let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
  let type_tag = struct_type_tag(input)?;

  let fields = match &input.data {
    Data::Struct(data) => match &data.fields {
      Fields::Named(named) => named.named.iter().map(parse_field).collect::<syn::Result<Vec<_>>>()?,
      _ => {
        return Err(syn::Error::new_spanned(
          name,
          "Resource can only be derived for structs with named fields",
        ))
      }
    },
    _ => {
      return Err(syn::Error::new_spanned(
        name,
        "Resource can only be derived for structs with named fields",
      ))
    }
  };

  let attribute_arms = fields
    .iter()
    .filter(|field| matches!(field.kind, FieldKind::Attribute))
    .map(|field| {
      let ident = &field.ident;
      let key = ident.to_string();
      quote! {
        #key => ::std::result::Result::Ok(::std::option::Option::Some(
          ::nexus_serializer_core_rs::serde_json::to_value(&self.#ident)?,
        )),
      }
    });

  let json_inserts = fields
    .iter()
    .filter(|field| matches!(field.kind, FieldKind::Attribute))
    .map(|field| {
      let ident = &field.ident;
      let key = ident.to_string();
      quote! {
        map.insert(
          #key.to_string(),
          ::nexus_serializer_core_rs::serde_json::to_value(&self.#ident)?,
        );
      }
    });

  let association_arms = fields.iter().filter_map(|field| {
    let ident = &field.ident;
    let key = ident.to_string();
    let value = match (&field.kind, field.optional) {
      (FieldKind::HasMany, _) => quote! {
        ::nexus_serializer_core_rs::AssociationValue::from_handles(
          self.#ident.iter().map(::nexus_serializer_core_rs::resource_handle).collect(),
        )
      },
      (FieldKind::HasOne, true) => quote! {
        ::nexus_serializer_core_rs::AssociationValue::One(
          self.#ident.as_ref().map(::nexus_serializer_core_rs::resource_handle),
        )
      },
      (FieldKind::HasOne, false) => quote! {
        ::nexus_serializer_core_rs::AssociationValue::One(
          ::std::option::Option::Some(::nexus_serializer_core_rs::resource_handle(&self.#ident)),
        )
      },
      _ => return None,
    };
    Some(quote! {
      #key => ::std::option::Option::Some(#value),
    })
  });

  let expanded = quote! {
    impl #impl_generics ::nexus_serializer_core_rs::Resource for #name #ty_generics #where_clause {
      fn type_tag(&self) -> &str {
        #type_tag
      }

      fn read_attribute(
        &self,
        name: &str,
      ) -> ::std::result::Result<
        ::std::option::Option<::nexus_serializer_core_rs::serde_json::Value>,
        ::nexus_serializer_core_rs::SerializeError,
      > {
        match name {
          #(#attribute_arms)*
          _ => ::std::result::Result::Ok(::std::option::Option::None),
        }
      }

      fn association(&self, name: &str) -> ::std::option::Option<::nexus_serializer_core_rs::AssociationValue> {
        match name {
          #(#association_arms)*
          _ => ::std::option::Option::None,
        }
      }

      fn as_json(
        &self,
      ) -> ::std::result::Result<
        ::nexus_serializer_core_rs::serde_json::Value,
        ::nexus_serializer_core_rs::SerializeError,
      > {
        let mut map = ::nexus_serializer_core_rs::serde_json::Map::new();
        #(#json_inserts)*
        ::std::result::Result::Ok(::nexus_serializer_core_rs::serde_json::Value::Object(map))
      }

      fn as_any(&self) -> &(dyn ::std::any::Any + Send + Sync) {
        self
      }
    }
  };

  Ok(expanded)
}

fn struct_type_tag(input: &DeriveInput) -> syn::Result<String> {
  let mut type_tag = input.ident.to_string();
  for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("resource")) {
    attr.parse_nested_meta(|meta| {
      if meta.path.is_ident("type_tag") {
        let value: LitStr = meta.value()?.parse()?;
        type_tag = value.value();
        Ok(())
      } else {
        Err(meta.error("expected `type_tag = \"...\"`"))
      }
    })?;
  }
  Ok(type_tag)
}

fn parse_field(field: &Field) -> syn::Result<ResourceField> {
  let ident = field
    .ident
    .clone()
    .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
  let mut kind = FieldKind::Attribute;
  for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("resource")) {
    attr.parse_nested_meta(|meta| {
      if meta.path.is_ident("has_one") {
        kind = FieldKind::HasOne;
      } else if meta.path.is_ident("has_many") {
        kind = FieldKind::HasMany;
      } else if meta.path.is_ident("skip") {
        kind = FieldKind::Skip;
      } else {
        return Err(meta.error("expected `has_one`, `has_many` or `skip`"));
      }
      Ok(())
    })?;
  }
  Ok(ResourceField {
    ident,
    kind,
    optional: option_inner(&field.ty).is_some(),
  })
}

fn option_inner(ty: &Type) -> Option<&Type> {
  let Type::Path(path) = ty else {
    return None;
  };
  let segment = path.path.segments.last()?;
  if segment.ident != "Option" {
    return None;
  }
  match &segment.arguments {
    PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
      GenericArgument::Type(inner) => Some(inner),
      _ => None,
    }),
    _ => None,
  }
}
