use docrepo::collection::{Document, ObjectId};
use docrepo::common::{Convertible, FieldKind, IdRepr, Value};
use docrepo::doc;
use docrepo::errors::ErrorKind;
use docrepo::repository::{Entity, Model, ModelMapper};
use docrepo_derive::{Convertible, Entity};
use docrepo_int_test::test_util::{Bar, Comment, Country, Estimate, Foo, Spam, SpamCount, Status, Ticket};

#[derive(Debug, Clone, PartialEq, Convertible, Entity)]
struct Article {
    #[entity(id)]
    slug: String,
    r#type: String,
    tags: Vec<String>,
}

#[test]
fn test_unit_enum_converts_to_name() {
    assert_eq!(Status::InProgress.to_value().unwrap(), Value::from("InProgress"));
    assert_eq!(Status::from_value(&Value::from("Closed")).unwrap(), Status::Closed);

    let err = Status::from_value(&Value::from("Reopened")).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MappingError);

    let err = Status::from_value(&Value::I32(1)).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MappingError);
}

#[test]
fn test_data_enum_converts_to_variant_document() {
    let value = Estimate::Range { low: 1, high: 3 }.to_value().unwrap();
    assert_eq!(
        value,
        Value::Document(doc! {
            variant: "Range",
            value: { low: 1, high: 3 }
        })
    );
    assert_eq!(Estimate::from_value(&value).unwrap(), Estimate::Range { low: 1, high: 3 });

    let value = Estimate::Points(5).to_value().unwrap();
    assert_eq!(value, Value::Document(doc! { variant: "Points", value: [5] }));
    assert_eq!(Estimate::from_value(&value).unwrap(), Estimate::Points(5));

    let value = Estimate::Unknown.to_value().unwrap();
    assert_eq!(value, Value::Document(doc! { variant: "Unknown", value: (Value::Null) }));
    assert_eq!(Estimate::from_value(&value).unwrap(), Estimate::Unknown);
}

#[test]
fn test_data_enum_errors() {
    let err = Estimate::from_value(&Value::Document(doc! { variant: "Points", value: [1, 2] })).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MappingError);

    let err = Estimate::from_value(&Value::Document(doc! { value: 1 })).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MappingError);

    let err = Estimate::from_value(&Value::Document(doc! { variant: "Range", value: { low: 1 } })).unwrap_err();
    assert_eq!(err.field(), Some("high"));
}

#[test]
fn test_struct_round_trip() {
    let bar = Bar {
        apple: "red".to_string(),
        banana: "yellow".to_string(),
    };
    let value = bar.to_value().unwrap();
    assert_eq!(value, Value::Document(doc! { apple: "red", banana: "yellow" }));
    assert_eq!(Bar::from_value(&value).unwrap(), bar);
}

#[test]
fn test_default_and_optional_fields() {
    let bar = Bar::from_value(&Value::Document(doc! { apple: "red" })).unwrap();
    assert_eq!(bar.banana, "");

    let foo = Foo::from_value(&Value::Document(doc! { count: 3 })).unwrap();
    assert_eq!(foo, Foo { count: 3, size: None });

    let err = Foo::from_value(&Value::Document(doc! { size: 1.5 })).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MappingError);
    assert_eq!(err.field(), Some("count"));
}

#[test]
fn test_nested_error_path() {
    let value = Value::Document(doc! {
        name: "spam",
        foo: { count: 1 },
        bars: [{ apple: "red" }, { apple: 7 }]
    });
    let err = Spam::from_value(&value).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MappingError);
    assert_eq!(err.field(), Some("bars.1.apple"));
}

#[test]
fn test_schema_of_derived_entity() {
    let schema = Spam::schema();
    assert_eq!(schema.name(), "spams");

    let id = schema.id().expect("identifier");
    assert_eq!(id.attribute(), "id");
    assert_eq!(id.repr(), IdRepr::Native);
    assert!(!id.is_required());

    let required: Vec<&str> = schema.required_fields().map(|field| field.name()).collect();
    assert_eq!(required, vec!["name", "foo", "bars"]);

    let foo = schema.field("foo").expect("foo");
    assert!(matches!(foo.kind(), FieldKind::Embedded(_)));
    let bars = schema.field("bars").expect("bars");
    assert!(matches!(bars.kind(), FieldKind::Sequence(_)));
    assert!(!schema.field("name").expect("name").kind().has_embedded());

    assert!(Foo::schema().id().is_none());
    assert!(!Foo::schema().field("size").expect("size").is_required());
    assert!(!Bar::schema().field("banana").expect("banana").is_required());
    assert!(SpamCount::schema().validate().is_ok());
}

#[test]
fn test_ignored_field_is_not_declared() {
    let schema = Ticket::schema();
    assert!(schema.field("dirty").is_none());
    assert_eq!(schema.id().map(|id| id.repr()), Some(IdRepr::Text));
    assert_eq!(Comment::schema().id().map(|id| id.repr()), Some(IdRepr::Text));
}

#[test]
fn test_identifier_attributes() {
    assert_eq!(Country::schema().id().map(|id| id.attribute()), Some("code"));

    let schema = Article::schema();
    let id = schema.id().expect("identifier");
    assert_eq!(id.attribute(), "slug");
    assert_eq!(id.repr(), IdRepr::Text);
    assert!(id.is_required());
    assert!(schema.field("type").is_some());

    let mut article = Article {
        slug: String::new(),
        r#type: "news".to_string(),
        tags: vec![],
    };
    assert_eq!(article.id(), None);

    let oid = ObjectId::new();
    article.set_id(oid.to_hex());
    assert_eq!(article.id(), Some(&oid.to_hex()));

    let mut country = Country {
        code: None,
        name: "Chile".to_string(),
    };
    country.set_id(oid);
    assert_eq!(country.code, Some(oid));
}

#[test]
fn test_mapper_round_trip_with_required_text_identifier() {
    let mapper = ModelMapper::default();
    let oid = ObjectId::new();
    let article = Article {
        slug: oid.to_hex(),
        r#type: "news".to_string(),
        tags: vec!["rust".to_string()],
    };

    let document = mapper.to_document(&article).unwrap();
    assert_eq!(document.get("_id"), Value::ObjectId(oid));
    assert_eq!(document.get("type"), Value::from("news"));
    assert!(!document.contains_key("slug"));

    assert_eq!(mapper.to_model::<Article>(document).unwrap(), article);

    let err = mapper
        .to_model::<Article>(doc! { "type": "news", tags: [] })
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MappingError);
    assert_eq!(err.field(), Some("slug"));
}

#[test]
fn test_mapper_drops_undeclared_keys() {
    let mapper = ModelMapper::default();
    let mut document: Document = doc! { count: 2, size: 1.5, color: "blue" };
    document.insert("_id", ObjectId::new());

    let foo = mapper.to_model::<Foo>(document).unwrap();
    assert_eq!(foo, Foo { count: 2, size: Some(1.5) });
}
