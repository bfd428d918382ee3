use super::*;
use crate::association::AssociationOptions;
use crate::collection::CollectionOverride;
use crate::config_option::AssembleOption;
use crate::definition::SerializerDefinition;
use crate::resource::DynamicResource;
use serde_json::json;
use std::sync::Arc;

fn comment(id: u64) -> ResourceHandle {
  Arc::new(DynamicResource::new("Comment").with_attribute("id", id))
}

fn post(id: u64, comments: Vec<ResourceHandle>) -> ResourceHandle {
  Arc::new(
    DynamicResource::new("Post")
      .with_attributes(json!({"id": id, "title": format!("post {}", id)}))
      .with_has_many("comments", comments),
  )
}

fn assembler() -> DocumentAssembler {
  let registry = SerializerRegistry::new();
  registry
    .register(
      SerializerDefinition::builder("Post")
        .attributes(["id", "title"])
        .has_many("comments", AssociationOptions::new().element_type("Comment"))
        .build()
        .expect("build post"),
    )
    .expect("register post");
  registry
    .register(
      SerializerDefinition::builder("Comment")
        .attributes(["id"])
        .build()
        .expect("build comment"),
    )
    .expect("register comment");
  DocumentAssembler::new(registry)
}

#[test]
fn single_resource_is_wrapped_in_its_singular_key() {
  let document = assembler()
    .assemble(post(1, vec![comment(7)]), &ScopeHandle::none(), &AssembleConfig::default())
    .expect("assemble");
  assert_eq!(
    document,
    json!({"post": {"id": 1, "title": "post 1", "comments": [{"id": 7}]}})
  );
}

#[test]
fn collection_is_wrapped_in_its_plural_key() {
  let document = assembler()
    .assemble(
      vec![post(1, Vec::new()), post(2, Vec::new())],
      &ScopeHandle::none(),
      &AssembleConfig::default(),
    )
    .expect("assemble");
  assert_eq!(document["posts"].as_array().map(Vec::len), Some(2));
}

#[test]
fn root_can_be_renamed_or_disabled() {
  let assembler = assembler();
  let named = assembler
    .assemble(
      post(1, Vec::new()),
      &ScopeHandle::none(),
      &AssembleConfig::from([AssembleOption::with_root_key("article")]),
    )
    .expect("assemble");
  assert_eq!(named, json!({"article": {"id": 1, "title": "post 1", "comments": []}}));

  let bare = assembler
    .assemble(
      post(1, Vec::new()),
      &ScopeHandle::none(),
      &AssembleConfig::from([AssembleOption::without_root(), AssembleOption::with_meta(json!({"page": 1}))]),
    )
    .expect("assemble");
  assert_eq!(bare, json!({"id": 1, "title": "post 1", "comments": []}));
}

#[test]
fn meta_is_attached_under_its_key() {
  let document = assembler()
    .assemble(
      vec![post(1, Vec::new())],
      &ScopeHandle::none(),
      &AssembleConfig::from([
        AssembleOption::with_meta(json!({"total": 1})),
        AssembleOption::with_meta_key("pagination"),
      ]),
    )
    .expect("assemble");
  assert_eq!(document["pagination"], json!({"total": 1}));
  let keys = document.as_object().expect("object").keys().collect::<Vec<_>>();
  assert_eq!(keys, vec!["posts", "pagination"]);
}

#[test]
fn side_loaded_members_sit_next_to_the_root() {
  let document = assembler()
    .assemble(
      vec![post(1, vec![comment(1), comment(2)]), post(2, vec![comment(2)])],
      &ScopeHandle::none(),
      &AssembleConfig::from([AssembleOption::with_shape(Shape::SideLoaded)]),
    )
    .expect("assemble");
  assert_eq!(
    document,
    json!({
      "posts": [
        {"id": 1, "title": "post 1", "comment_ids": [1, 2]},
        {"id": 2, "title": "post 2", "comment_ids": [2]}
      ],
      "comments": [{"id": 1}, {"id": 2}]
    })
  );
}

#[test]
fn side_loading_without_a_root_is_rejected() {
  let error = assembler()
    .assemble(
      post(1, Vec::new()),
      &ScopeHandle::none(),
      &AssembleConfig::from([AssembleOption::with_shape(Shape::SideLoaded), AssembleOption::without_root()]),
    )
    .expect_err("invalid config");
  assert!(matches!(error, SerializeError::InvalidConfig(_)));
}

#[test]
fn empty_collection_without_definition_has_no_root() {
  let assembler = assembler();
  let error = assembler
    .assemble(Vec::<ResourceHandle>::new(), &ScopeHandle::none(), &AssembleConfig::default())
    .expect_err("unresolvable root");
  assert!(matches!(error, SerializeError::UnresolvableRoot));

  let definition = assembler.registry().find("Post").expect("post");
  let document = assembler
    .assemble(
      Vec::<ResourceHandle>::new(),
      &ScopeHandle::none(),
      &AssembleConfig::from([AssembleOption::with_definition(definition)]),
    )
    .expect("assemble");
  assert_eq!(document, json!({"posts": []}));

  let document = assembler
    .assemble(
      Vec::<ResourceHandle>::new(),
      &ScopeHandle::none(),
      &AssembleConfig::from([AssembleOption::with_root_key("posts")]),
    )
    .expect("assemble");
  assert_eq!(document, json!({"posts": []}));
}

#[test]
fn heterogeneous_collection_becomes_the_document() {
  let user: ResourceHandle = Arc::new(DynamicResource::new("User").with_attribute("id", 3));
  let document = assembler()
    .assemble(
      vec![post(1, Vec::new()), user],
      &ScopeHandle::none(),
      &AssembleConfig::from([AssembleOption::with_meta(json!({"mixed": true}))]),
    )
    .expect("assemble");
  assert_eq!(
    document,
    json!({
      "posts": [{"id": 1, "title": "post 1", "comments": []}],
      "users": [{"id": 3}],
      "meta": {"mixed": true}
    })
  );
}

#[test]
fn scope_is_taken_from_the_provider() {
  struct Request {
    user: &'static str,
  }
  let registry = SerializerRegistry::new();
  registry
    .register(
      SerializerDefinition::builder("Post")
        .attributes(["id"])
        .attributes_override(|mut base, _, scope| {
          if let Some(user) = scope.to_typed::<&'static str>() {
            base.insert("viewer".to_string(), json!(user));
          }
          Ok(base)
        })
        .build()
        .expect("build post"),
    )
    .expect("register post");
  let assembler = DocumentAssembler::new(registry);
  let provider = |request: &Request| ScopeHandle::new(request.user);

  let document = assembler
    .assemble_for_request(
      &Request { user: "alice" },
      &provider,
      post(1, Vec::new()),
      &AssembleConfig::default(),
    )
    .expect("assemble");
  assert_eq!(document, json!({"post": {"id": 1, "viewer": "alice"}}));
}

#[test]
fn collection_override_object_is_the_document_body() {
  let items = CollectionOverride::new(|elements| {
    let items = elements.into_iter().map(|element| element.value().clone()).collect();
    Ok(json!({"items": Value::Array(items)}))
  });
  let document = assembler()
    .assemble(
      vec![post(1, Vec::new()), post(2, Vec::new())],
      &ScopeHandle::none(),
      &AssembleConfig::from([
        AssembleOption::with_collection_override(items),
        AssembleOption::with_meta(json!({"page": 1})),
      ]),
    )
    .expect("assemble");
  assert_eq!(
    document,
    json!({
      "items": [
        {"id": 1, "title": "post 1", "comments": []},
        {"id": 2, "title": "post 2", "comments": []}
      ],
      "meta": {"page": 1}
    })
  );
  assert!(document.get("posts").is_none());
}

#[test]
fn collection_override_array_is_returned_as_is() {
  let tagged = CollectionOverride::new(|elements| {
    Ok(Value::Array(
      elements
        .into_iter()
        .map(|element| json!({"type": element.type_tag(), "data": element.value()}))
        .collect(),
    ))
  });
  let user: ResourceHandle = Arc::new(DynamicResource::new("User").with_attribute("id", 3));
  let document = assembler()
    .assemble(
      vec![post(1, Vec::new()), user],
      &ScopeHandle::none(),
      &AssembleConfig::from([AssembleOption::with_collection_override(tagged)]),
    )
    .expect("assemble");
  assert_eq!(
    document,
    json!([
      {"type": "Post", "data": {"id": 1, "title": "post 1", "comments": []}},
      {"type": "User", "data": {"id": 3}}
    ])
  );
}

#[test]
fn side_loads_merge_into_an_overridden_body() {
  let assembler = assembler();
  let items = || {
    CollectionOverride::new(|elements| {
      let items = elements.into_iter().map(|element| element.value().clone()).collect();
      Ok(json!({"items": Value::Array(items)}))
    })
  };
  let document = assembler
    .assemble(
      vec![post(1, vec![comment(5)])],
      &ScopeHandle::none(),
      &AssembleConfig::from([
        AssembleOption::with_shape(Shape::SideLoaded),
        AssembleOption::with_collection_override(items()),
      ]),
    )
    .expect("assemble");
  assert_eq!(
    document,
    json!({
      "items": [{"id": 1, "title": "post 1", "comment_ids": [5]}],
      "comments": [{"id": 5}]
    })
  );

  let named = assembler
    .assemble(
      vec![post(1, Vec::new())],
      &ScopeHandle::none(),
      &AssembleConfig::from([
        AssembleOption::with_root_key("feed"),
        AssembleOption::with_collection_override(items()),
      ]),
    )
    .expect("assemble");
  assert_eq!(named, json!({"feed": {"items": [{"id": 1, "title": "post 1", "comments": []}]}}));
}

#[test]
fn side_loads_need_an_object_override() {
  let flat = CollectionOverride::new(|elements| {
    Ok(Value::Array(elements.into_iter().map(|element| element.value().clone()).collect()))
  });
  let error = assembler()
    .assemble(
      vec![post(1, vec![comment(5)])],
      &ScopeHandle::none(),
      &AssembleConfig::from([
        AssembleOption::with_shape(Shape::SideLoaded),
        AssembleOption::with_collection_override(flat),
      ]),
    )
    .expect_err("invalid config");
  assert!(matches!(error, SerializeError::InvalidConfig(_)));
}
