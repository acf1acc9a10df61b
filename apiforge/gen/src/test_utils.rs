//! Shared model fixtures for apiforge-gen unit tests.

use apiforge_define::{
    ApiModel, Definition, HttpMethod, Parameter, PathMethodModel, PathModel, Property, Rule, Tag,
    TypeRef,
};

/// `User { id: int (required), name: string (optional) }` and no routes.
pub fn user_model() -> ApiModel {
    ApiModel::new("Users").with_definition(
        Definition::new("User")
            .with_property(Property::required("id", TypeRef::int()))
            .with_property(Property::optional("name", TypeRef::string())),
    )
}

/// A definition whose properties carry rules, one required and one optional.
pub fn ruled_model() -> ApiModel {
    ApiModel::new("Accounts").with_definition(
        Definition::new("Account")
            .with_property(Property::required("age", TypeRef::int()).with_rule(Rule::range(Some(1.0), None)))
            .with_property(Property::optional("nickname", TypeRef::string()).with_rule(Rule::NonEmpty))
            .with_property(Property::optional("note", TypeRef::string())),
    )
}

/// A small pet store.
///
/// - `GET /pets` (tag `pets`): optional `limit` query, returns a list of `Pet`
/// - `POST /pets` (tag `pets`, `bearer` secured): `Pet` request body
/// - `GET /pets/{petId}` and `DELETE /pets/{petId}`: untagged
pub fn petstore_model() -> ApiModel {
    ApiModel::new("Petstore")
        .with_description("Sample pet store")
        .with_tag(Tag {
            name: "pets".to_string(),
            description: Some("Everything about pets".to_string()),
        })
        .with_definition(
            Definition::new("Pet")
                .with_property(Property::required("id", TypeRef::int()))
                .with_property(Property::required("name", TypeRef::string()))
                .with_property(Property::optional("tag", TypeRef::string())),
        )
        .with_route(
            PathModel::new("/pets")
                .with_method(
                    PathMethodModel::new(HttpMethod::Get, "/pets")
                        .with_operation_id("listPets")
                        .with_summary("List all pets")
                        .with_parameter(
                            Parameter::query("limit", TypeRef::int())
                                .optional()
                                .with_description("How many items to return"),
                        )
                        .with_response(TypeRef::list_of(TypeRef::reference("Pet")))
                        .with_tag("pets"),
                )
                .with_method(
                    PathMethodModel::new(HttpMethod::Post, "/pets")
                        .with_operation_id("createPet")
                        .with_summary("Create a pet")
                        .with_request_body(TypeRef::reference("Pet"))
                        .with_response(TypeRef::reference("Pet"))
                        .with_security("bearer")
                        .with_error(401, "Missing or invalid token")
                        .with_tag("pets"),
                ),
        )
        .with_route(
            PathModel::new("/pets/{petId}")
                .with_method(
                    PathMethodModel::new(HttpMethod::Get, "/pets/{petId}")
                        .with_operation_id("getPet")
                        .with_summary("Info for a specific pet")
                        .with_parameter(Parameter::path("petId", TypeRef::int()))
                        .with_response(TypeRef::reference("Pet"))
                        .with_error(404, "Pet not found"),
                )
                .with_method(
                    PathMethodModel::new(HttpMethod::Delete, "/pets/{petId}")
                        .with_operation_id("deletePet")
                        .with_parameter(Parameter::path("petId", TypeRef::int())),
                ),
        )
}
