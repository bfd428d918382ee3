use super::*;
use crate::association::AssociationOptions;
use crate::resource::DynamicResource;
use serde_json::json;

#[derive(Debug)]
struct Viewer {
  moderator: bool,
}

fn comment(id: u64) -> ResourceHandle {
  Arc::new(
    DynamicResource::new("Comment")
      .with_attribute("id", id)
      .with_attribute("body", format!("comment {}", id)),
  )
}

fn post(comments: Vec<ResourceHandle>) -> DynamicResource {
  DynamicResource::new("Post")
    .with_attributes(json!({"id": 1, "title": "Hello Blog!"}))
    .with_has_many("comments", comments)
    .with_has_one("author", None)
}

fn registry() -> SerializerRegistry {
  let registry = SerializerRegistry::new();
  registry
    .register(
      SerializerDefinition::builder("Comment")
        .attributes(["id", "body"])
        .build()
        .expect("build comment"),
    )
    .expect("register comment");
  registry
}

fn post_definition(options: AssociationOptions) -> Arc<SerializerDefinition> {
  Arc::new(
    SerializerDefinition::builder("Post")
      .attributes(["id", "title"])
      .has_many("comments", options)
      .build()
      .expect("build post"),
  )
}

fn serialize(
  registry: &SerializerRegistry,
  shape: Shape,
  definition: Arc<SerializerDefinition>,
  resource: &dyn Resource,
  scope: &ScopeHandle,
) -> (Value, SideloadCollector) {
  let mut context = ResolutionContext::new(registry, shape);
  let value = SerializerInstance::new(definition, resource, scope)
    .serialize(&DefinitionChain::new(), &mut context)
    .expect("serialize");
  (value, context.into_sideloads())
}

#[test]
fn embeds_associations_after_attributes() {
  let registry = registry();
  let post = post(vec![comment(1), comment(2)]);
  let (value, sideloads) = serialize(
    &registry,
    Shape::Embedded,
    post_definition(AssociationOptions::new()),
    &post,
    &ScopeHandle::none(),
  );
  assert_eq!(
    value,
    json!({
      "id": 1,
      "title": "Hello Blog!",
      "comments": [{"id": 1, "body": "comment 1"}, {"id": 2, "body": "comment 2"}]
    })
  );
  let keys = value.as_object().expect("object").keys().collect::<Vec<_>>();
  assert_eq!(keys, vec!["id", "title", "comments"]);
  assert!(sideloads.is_empty());
}

#[test]
fn referenced_shape_emits_identifiers() {
  let registry = registry();
  let post = post(vec![comment(1), comment(2)]);
  let (value, _) = serialize(
    &registry,
    Shape::Referenced,
    post_definition(AssociationOptions::new()),
    &post,
    &ScopeHandle::none(),
  );
  assert_eq!(value, json!({"id": 1, "title": "Hello Blog!", "comment_ids": [1, 2]}));
}

#[test]
fn side_loaded_shape_collects_members_once() {
  let registry = registry();
  let post = post(vec![comment(1), comment(2), comment(1)]);
  let (value, sideloads) = serialize(
    &registry,
    Shape::SideLoaded,
    post_definition(AssociationOptions::new()),
    &post,
    &ScopeHandle::none(),
  );
  assert_eq!(value["comment_ids"], json!([1, 2, 1]));
  assert_eq!(sideloads.len(), 2);
  assert_eq!(
    Value::Object(sideloads.into_map()),
    json!({"comments": [{"id": 1, "body": "comment 1"}, {"id": 2, "body": "comment 2"}]})
  );
}

#[test]
fn excluded_association_is_omitted() {
  let registry = registry();
  let post = post(vec![comment(1)]);
  let definition = post_definition(
    AssociationOptions::new().include_when(|_, scope| scope.satisfies(|viewer: &Viewer| viewer.moderator)),
  );

  let visitor = ScopeHandle::new(Viewer { moderator: false });
  let (value, _) = serialize(&registry, Shape::Embedded, definition.clone(), &post, &visitor);
  assert_eq!(value, json!({"id": 1, "title": "Hello Blog!"}));

  let moderator = ScopeHandle::new(Viewer { moderator: true });
  let (value, _) = serialize(&registry, Shape::Embedded, definition, &post, &moderator);
  assert_eq!(value["comments"], json!([{"id": 1, "body": "comment 1"}]));
}

#[test]
fn absent_has_one_renders_null() {
  let registry = registry();
  let definition = Arc::new(
    SerializerDefinition::builder("Post")
      .attributes(["id"])
      .has_one("author", AssociationOptions::new())
      .build()
      .expect("build post"),
  );
  let post = post(Vec::new());

  let (embedded, _) = serialize(&registry, Shape::Embedded, definition.clone(), &post, &ScopeHandle::none());
  assert_eq!(embedded, json!({"id": 1, "author": null}));
  let (referenced, _) = serialize(&registry, Shape::Referenced, definition, &post, &ScopeHandle::none());
  assert_eq!(referenced, json!({"id": 1, "author_id": null}));
}

#[test]
fn empty_collection_without_element_type_is_unresolvable() {
  let registry = registry();
  let post = post(Vec::new());
  let mut context = ResolutionContext::new(&registry, Shape::Embedded);
  let error = SerializerInstance::new(
    post_definition(AssociationOptions::new()),
    &post,
    &ScopeHandle::none(),
  )
  .serialize(&DefinitionChain::new(), &mut context)
  .expect_err("unresolvable");
  assert!(matches!(error, SerializeError::UnresolvableAssociation { .. }));

  let (value, _) = serialize(
    &registry,
    Shape::Embedded,
    post_definition(AssociationOptions::new().element_type("Comment")),
    &post,
    &ScopeHandle::none(),
  );
  assert_eq!(value["comments"], json!([]));
}

#[test]
fn scope_derivation_reaches_nested_members() {
  let registry = SerializerRegistry::new();
  registry
    .register(
      SerializerDefinition::builder("Comment")
        .attributes(["id"])
        .attributes_override(|mut base, _, scope| {
          base.insert("moderated".to_string(), json!(scope.satisfies(|viewer: &Viewer| viewer.moderator)));
          Ok(base)
        })
        .build()
        .expect("build comment"),
    )
    .expect("register comment");
  let definition = Arc::new(
    SerializerDefinition::builder("Post")
      .attributes(["id"])
      .has_many("comments", AssociationOptions::new())
      .scope_with(|_, _| ScopeHandle::new(Viewer { moderator: true }))
      .build()
      .expect("build post"),
  );
  let post = post(vec![comment(3)]);

  let instance = SerializerInstance::new(definition, &post, &ScopeHandle::none());
  assert!(instance.scope().satisfies(|viewer: &Viewer| viewer.moderator));
  let mut context = ResolutionContext::new(&registry, Shape::Embedded);
  let value = instance
    .serialize(&DefinitionChain::new(), &mut context)
    .expect("serialize");
  assert_eq!(value["comments"], json!([{"id": 3, "moderated": true}]));
}

#[test]
fn unregistered_member_type_uses_raw_mapping() {
  let registry = SerializerRegistry::new();
  let post = post(vec![comment(4)]);
  let (value, _) = serialize(
    &registry,
    Shape::Embedded,
    post_definition(AssociationOptions::new()),
    &post,
    &ScopeHandle::none(),
  );
  assert_eq!(value["comments"], json!([{"id": 4, "body": "comment 4"}]));
}

#[test]
fn side_loading_terminates_on_cycles() {
  let registry = SerializerRegistry::new();
  registry
    .register(
      SerializerDefinition::builder("User")
        .attributes(["id"])
        .has_many("friends", AssociationOptions::new().element_type("User"))
        .build()
        .expect("build user"),
    )
    .expect("register user");
  let alice_ref: ResourceHandle = Arc::new(DynamicResource::new("User").with_attribute("id", 1));
  let bob: ResourceHandle = Arc::new(
    DynamicResource::new("User")
      .with_attribute("id", 2)
      .with_has_many("friends", vec![alice_ref]),
  );
  let alice = DynamicResource::new("User")
    .with_attribute("id", 1)
    .with_has_many("friends", vec![bob]);
  let definition = registry.find("User").expect("user");

  let mut context = ResolutionContext::new(&registry, Shape::SideLoaded);
  context.reserve_primary(&alice).expect("reserve");
  let value = SerializerInstance::new(definition, &alice, &ScopeHandle::none())
    .serialize(&DefinitionChain::new(), &mut context)
    .expect("serialize");
  assert_eq!(value, json!({"id": 1, "friend_ids": [2]}));
  assert_eq!(
    Value::Object(context.into_sideloads().into_map()),
    json!({"users": [{"id": 2, "friend_ids": [1]}]})
  );
}

#[test]
fn embedded_back_reference_stops_at_the_nesting_limit() {
  let registry = SerializerRegistry::new();
  let definition = Arc::new(
    SerializerDefinition::builder("Comment")
      .attributes(["id"])
      .has_one("post", AssociationOptions::new())
      .nested(
        SerializerDefinition::builder("Post")
          .attributes(["id"])
          .has_one("comment", AssociationOptions::new())
          .accessor("comment", |_, _| {
            Ok(AssociationValue::one(DynamicResource::new("Comment").with_attribute("id", 1)))
          })
          .build()
          .expect("build post"),
      )
      .accessor("post", |_, _| {
        Ok(AssociationValue::one(DynamicResource::new("Post").with_attribute("id", 1)))
      })
      .build()
      .expect("build comment"),
  );
  registry.register_shared(definition.clone()).expect("register comment");
  let comment = DynamicResource::new("Comment").with_attribute("id", 1);

  let mut context = ResolutionContext::new(&registry, Shape::Embedded);
  let error = SerializerInstance::new(definition, &comment, &ScopeHandle::none())
    .serialize(&DefinitionChain::new(), &mut context)
    .expect_err("cycle must be cut");
  assert!(matches!(
    error,
    SerializeError::NestingTooDeep { limit, .. } if limit == MAX_NESTING_DEPTH
  ));
}
