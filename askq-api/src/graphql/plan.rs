//! Validation of a parsed document against the schema.
//!
//! [`prepare`] picks the operation to run, coerces the request variables,
//! applies `@skip`/`@include` and resolves every argument, producing a
//! [`PreparedOperation`] the executor can run without further checks. Errors
//! are collected rather than returned on first failure so clients see every
//! problem with a document at once.

use std::collections::{HashMap, HashSet};
use std::fmt;

use graphql_parser::query::{
    Definition, Directive, Document, Field, OperationDefinition, Selection, SelectionSet, Type,
    Value, VariableDefinition,
};
use graphql_parser::Pos;
use serde_json::{Map, Value as Json};
use shared_types::{ErrorCode, GraphQlError, Question};

use super::schema::{
    question_field_type, ASK_QUESTION_FIELD, INPUT_SCALARS, MUTATION_TYPE, QUERY_TYPE,
    QUESTIONS_FIELD, QUESTION_ARG, QUESTION_TYPE, TYPENAME_FIELD,
};

pub type Variables = Map<String, Json>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Query => write!(f, "query"),
            OperationType::Mutation => write!(f, "mutation"),
            OperationType::Subscription => write!(f, "subscription"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionField {
    Id,
    Question,
    Answer,
    Typename,
}

impl QuestionField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(QuestionField::Id),
            "question" => Some(QuestionField::Question),
            "answer" => Some(QuestionField::Answer),
            TYPENAME_FIELD => Some(QuestionField::Typename),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            QuestionField::Id => "id",
            QuestionField::Question => "question",
            QuestionField::Answer => "answer",
            QuestionField::Typename => TYPENAME_FIELD,
        }
    }
}

/// Ordered selection of `Question` fields under their response keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    fields: Vec<(String, QuestionField)>,
}

impl Projection {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    pub fn project(&self, record: &Question) -> Json {
        let mut object = Map::new();
        for (key, field) in &self.fields {
            let value = match field {
                QuestionField::Id => Json::String(record.id.to_string()),
                QuestionField::Question => Json::String(record.question.clone()),
                QuestionField::Answer => Json::String(record.answer.clone()),
                QuestionField::Typename => Json::String(QUESTION_TYPE.to_string()),
            };
            object.insert(key.clone(), value);
        }
        Json::Object(object)
    }

    fn insert(&mut self, key: &str, field: QuestionField, pos: Pos, errors: &mut Vec<GraphQlError>) {
        match self.fields.iter().find(|(existing, _)| existing == key) {
            Some((_, existing)) if *existing != field => {
                errors.push(field_conflict(key, existing.name(), field.name(), pos));
            }
            Some(_) => {}
            None => self.fields.push((key.to_string(), field)),
        }
    }

    fn merge(&mut self, other: Projection, pos: Pos, errors: &mut Vec<GraphQlError>) {
        for (key, field) in other.fields {
            self.insert(&key, field, pos, errors);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RootField {
    /// `__typename` on the root type; carries the type name
    Typename(&'static str),
    Questions(Projection),
    AskQuestion {
        question: String,
        projection: Projection,
    },
}

impl RootField {
    fn field_name(&self) -> &'static str {
        match self {
            RootField::Typename(_) => TYPENAME_FIELD,
            RootField::Questions(_) => QUESTIONS_FIELD,
            RootField::AskQuestion { .. } => ASK_QUESTION_FIELD,
        }
    }
}

/// A validated operation with its variables already applied
#[derive(Debug, Clone)]
pub struct PreparedOperation {
    pub kind: OperationType,
    pub name: Option<String>,
    pub fields: Vec<(String, RootField)>,
}

impl PreparedOperation {
    pub fn is_mutation(&self) -> bool {
        self.kind == OperationType::Mutation
    }

    /// Operation name for logs
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }
}

/// Uniform view over the four operation shapes of the parser
#[derive(Clone, Copy)]
struct Operation<'d, 'a> {
    kind: OperationType,
    name: Option<&'d str>,
    position: Pos,
    variables: &'d [VariableDefinition<'a, String>],
    directives: &'d [Directive<'a, String>],
    selection_set: &'d SelectionSet<'a, String>,
}

impl<'d, 'a> Operation<'d, 'a> {
    fn from_definition(definition: &'d OperationDefinition<'a, String>) -> Self {
        match definition {
            OperationDefinition::SelectionSet(selection_set) => Operation {
                kind: OperationType::Query,
                name: None,
                position: selection_set.span.0,
                variables: &[],
                directives: &[],
                selection_set,
            },
            OperationDefinition::Query(query) => Operation {
                kind: OperationType::Query,
                name: query.name.as_deref(),
                position: query.position,
                variables: &query.variable_definitions,
                directives: &query.directives,
                selection_set: &query.selection_set,
            },
            OperationDefinition::Mutation(mutation) => Operation {
                kind: OperationType::Mutation,
                name: mutation.name.as_deref(),
                position: mutation.position,
                variables: &mutation.variable_definitions,
                directives: &mutation.directives,
                selection_set: &mutation.selection_set,
            },
            OperationDefinition::Subscription(subscription) => Operation {
                kind: OperationType::Subscription,
                name: subscription.name.as_deref(),
                position: subscription.position,
                variables: &subscription.variable_definitions,
                directives: &subscription.directives,
                selection_set: &subscription.selection_set,
            },
        }
    }
}

pub fn prepare(
    document: &Document<'_, String>,
    operation_name: Option<&str>,
    variables: Option<&Variables>,
) -> Result<PreparedOperation, Vec<GraphQlError>> {
    let operation = select_operation(document, operation_name)?;

    if operation.kind == OperationType::Subscription {
        return Err(vec![validation(
            "Schema is not configured to execute subscription operation.",
            operation.position,
        )]);
    }

    let mut planner = Planner::new(operation);
    planner.check_variable_definitions();
    planner.coerce_variables(variables);

    for directive in operation.directives {
        planner.errors.push(validation(
            format!(
                "Directive \"@{}\" may not be used on {}.",
                directive.name,
                operation.kind.to_string().to_uppercase()
            ),
            directive.position,
        ));
    }

    let fields = planner.plan_root(operation.selection_set);
    planner.check_unused_variables();

    // Static problems with the document take precedence over bad input values
    let (static_errors, input_errors): (Vec<_>, Vec<_>) = planner
        .errors
        .into_iter()
        .partition(|err| err.code() == ErrorCode::GraphqlValidationFailed);
    if !static_errors.is_empty() {
        return Err(static_errors);
    }
    if !input_errors.is_empty() {
        return Err(input_errors);
    }

    Ok(PreparedOperation {
        kind: operation.kind,
        name: operation.name.map(str::to_string),
        fields,
    })
}

fn select_operation<'d, 'a>(
    document: &'d Document<'a, String>,
    operation_name: Option<&str>,
) -> Result<Operation<'d, 'a>, Vec<GraphQlError>> {
    let mut operations = Vec::new();
    let mut errors = Vec::new();
    for definition in &document.definitions {
        match definition {
            Definition::Operation(operation) => {
                operations.push(Operation::from_definition(operation))
            }
            Definition::Fragment(fragment) => errors.push(fragments_unsupported(fragment.position)),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut seen = HashSet::new();
    for op in &operations {
        if let Some(name) = op.name {
            if !seen.insert(name) {
                return Err(vec![validation(
                    format!("There can be only one operation named \"{}\".", name),
                    op.position,
                )]);
            }
        }
    }
    if operations.len() > 1 {
        if let Some(op) = operations.iter().find(|op| op.name.is_none()) {
            return Err(vec![validation(
                "This anonymous operation must be the only defined operation.",
                op.position,
            )]);
        }
    }

    let selected = match operation_name {
        Some(name) => operations
            .into_iter()
            .find(|op| op.name == Some(name))
            .ok_or_else(|| {
                GraphQlError::new(
                    ErrorCode::BadUserInput,
                    format!("Unknown operation named \"{}\".", name),
                )
            }),
        None => match operations.as_slice() {
            [single] => Ok(*single),
            _ => Err(GraphQlError::new(
                ErrorCode::BadUserInput,
                "Must provide operation name if query contains multiple operations.",
            )),
        },
    };
    selected.map_err(|err| vec![err])
}

fn validation(message: impl Into<String>, pos: Pos) -> GraphQlError {
    GraphQlError::new(ErrorCode::GraphqlValidationFailed, message).at_location(pos.line, pos.column)
}

fn bad_input(message: impl Into<String>, pos: Pos) -> GraphQlError {
    GraphQlError::new(ErrorCode::BadUserInput, message).at_location(pos.line, pos.column)
}

fn fragments_unsupported(pos: Pos) -> GraphQlError {
    validation("Fragments are not supported; select the fields inline.", pos)
}

fn field_conflict(key: &str, first: &str, second: &str, pos: Pos) -> GraphQlError {
    validation(
        format!(
            "Fields \"{}\" conflict because \"{}\" and \"{}\" are different fields. Use different aliases on the fields to fetch both if this was intentional.",
            key, first, second
        ),
        pos,
    )
}

fn response_key<'f>(field: &'f Field<'_, String>) -> &'f str {
    field.alias.as_deref().unwrap_or(&field.name)
}

fn named_type<'t>(ty: &'t Type<'_, String>) -> &'t str {
    match ty {
        Type::NamedType(name) => name,
        Type::ListType(inner) | Type::NonNullType(inner) => named_type(inner),
    }
}

/// Why a value could not be coerced to an input type
enum CoerceError {
    Null,
    Invalid(String),
}

fn coerce_value(ty: &Type<'_, String>, value: &Json) -> Result<Json, CoerceError> {
    match ty {
        Type::NonNullType(inner) => {
            if value.is_null() {
                Err(CoerceError::Null)
            } else {
                coerce_value(inner, value)
            }
        }
        Type::ListType(inner) => match value {
            Json::Null => Ok(Json::Null),
            Json::Array(items) => items
                .iter()
                .map(|item| match coerce_value(inner, item) {
                    Err(CoerceError::Null) => Err(CoerceError::Invalid(format!(
                        "Expected non-nullable type \"{}\" not to be null.",
                        inner
                    ))),
                    other => other,
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Json::Array),
            single => coerce_value(inner, single).map(|item| Json::Array(vec![item])),
        },
        Type::NamedType(name) => {
            if value.is_null() {
                return Ok(Json::Null);
            }
            coerce_scalar(name, value).map_err(CoerceError::Invalid)
        }
    }
}

fn coerce_scalar(name: &str, value: &Json) -> Result<Json, String> {
    match name {
        "String" => match value {
            Json::String(_) => Ok(value.clone()),
            other => Err(format!("String cannot represent a non string value: {}", other)),
        },
        "ID" => match value {
            Json::String(_) => Ok(value.clone()),
            Json::Number(n) if n.is_i64() || n.is_u64() => Ok(Json::String(n.to_string())),
            other => Err(format!("ID cannot represent value: {}", other)),
        },
        "Int" => match value.as_i64() {
            Some(n) if i32::try_from(n).is_ok() => Ok(value.clone()),
            _ => Err(format!("Int cannot represent non-integer value: {}", value)),
        },
        "Float" => match value {
            Json::Number(_) => Ok(value.clone()),
            other => Err(format!("Float cannot represent non numeric value: {}", other)),
        },
        "Boolean" => match value {
            Json::Bool(_) => Ok(value.clone()),
            other => Err(format!("Boolean cannot represent a non boolean value: {}", other)),
        },
        other => Err(format!("Unknown type \"{}\".", other)),
    }
}

/// Converts a constant literal to JSON; `None` if it references a variable
fn literal_to_json(value: &Value<'_, String>) -> Option<Json> {
    let json = match value {
        Value::Variable(_) => return None,
        Value::Int(n) => n.as_i64().map(Json::from).unwrap_or(Json::Null),
        Value::Float(x) => serde_json::Number::from_f64(*x)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::String(s) | Value::Enum(s) => Json::String(s.clone()),
        Value::Boolean(b) => Json::Bool(*b),
        Value::Null => Json::Null,
        Value::List(items) => Json::Array(
            items
                .iter()
                .map(literal_to_json)
                .collect::<Option<Vec<_>>>()?,
        ),
        Value::Object(fields) => Json::Object(
            fields
                .iter()
                .map(|(name, value)| literal_to_json(value).map(|v| (name.clone(), v)))
                .collect::<Option<Map<_, _>>>()?,
        ),
    };
    Some(json)
}

struct Planner<'d, 'a> {
    operation: Operation<'d, 'a>,
    definitions: HashMap<&'d str, &'d VariableDefinition<'a, String>>,
    values: HashMap<String, Json>,
    /// Variables whose definition or value was already reported
    invalid: HashSet<String>,
    used: HashSet<String>,
    errors: Vec<GraphQlError>,
}

impl<'d, 'a> Planner<'d, 'a> {
    fn new(operation: Operation<'d, 'a>) -> Self {
        Self {
            operation,
            definitions: HashMap::new(),
            values: HashMap::new(),
            invalid: HashSet::new(),
            used: HashSet::new(),
            errors: Vec::new(),
        }
    }

    fn check_variable_definitions(&mut self) {
        for definition in self.operation.variables {
            let name = definition.name.as_str();
            if self.definitions.insert(name, definition).is_some() {
                self.errors.push(validation(
                    format!("There can be only one variable named \"${}\".", name),
                    definition.position,
                ));
                continue;
            }

            let base = named_type(&definition.var_type);
            if !INPUT_SCALARS.contains(&base) {
                let message = if [QUERY_TYPE, MUTATION_TYPE, QUESTION_TYPE].contains(&base) {
                    format!(
                        "Variable \"${}\" cannot be non-input type \"{}\".",
                        name, definition.var_type
                    )
                } else {
                    format!("Unknown type \"{}\".", base)
                };
                self.errors.push(validation(message, definition.position));
                self.invalid.insert(name.to_string());
                continue;
            }

            if let Some(default) = &definition.default_value {
                let reason = match literal_to_json(default) {
                    None => Some("default values must be constant".to_string()),
                    Some(json) => match coerce_value(&definition.var_type, &json) {
                        Ok(_) => None,
                        Err(CoerceError::Null) => Some(format!(
                            "Expected value of type \"{}\", found null.",
                            definition.var_type
                        )),
                        Err(CoerceError::Invalid(reason)) => Some(reason),
                    },
                };
                if let Some(reason) = reason {
                    self.errors.push(validation(
                        format!("Variable \"${}\" has invalid default value: {}", name, reason),
                        definition.position,
                    ));
                    self.invalid.insert(name.to_string());
                }
            }
        }
    }

    fn coerce_variables(&mut self, provided: Option<&Variables>) {
        for definition in self.operation.variables {
            let name = definition.name.as_str();
            if self.invalid.contains(name) || self.values.contains_key(name) {
                continue;
            }

            let value = match provided.and_then(|vars| vars.get(name)) {
                Some(value) => value.clone(),
                None => match definition.default_value.as_ref().and_then(literal_to_json) {
                    Some(default) => default,
                    None if matches!(definition.var_type, Type::NonNullType(_)) => {
                        self.errors.push(bad_input(
                            format!(
                                "Variable \"${}\" of required type \"{}\" was not provided.",
                                name, definition.var_type
                            ),
                            definition.position,
                        ));
                        self.invalid.insert(name.to_string());
                        continue;
                    }
                    None => continue,
                },
            };

            match coerce_value(&definition.var_type, &value) {
                Ok(coerced) => {
                    self.values.insert(name.to_string(), coerced);
                }
                Err(err) => {
                    let message = match err {
                        CoerceError::Null => format!(
                            "Variable \"${}\" of non-null type \"{}\" must not be null.",
                            name, definition.var_type
                        ),
                        CoerceError::Invalid(reason) => {
                            format!("Variable \"${}\" got invalid value {}; {}", name, value, reason)
                        }
                    };
                    self.errors.push(bad_input(message, definition.position));
                    self.invalid.insert(name.to_string());
                }
            }
        }
    }

    fn check_unused_variables(&mut self) {
        for definition in self.operation.variables {
            if !self.used.contains(&definition.name) {
                let message = match self.operation.name {
                    Some(op) => format!(
                        "Variable \"${}\" is never used in operation \"{}\".",
                        definition.name, op
                    ),
                    None => format!("Variable \"${}\" is never used.", definition.name),
                };
                self.errors.push(validation(message, definition.position));
            }
        }
    }

    fn undefined_variable(&self, name: &str, pos: Pos) -> GraphQlError {
        let message = match self.operation.name {
            Some(op) => format!("Variable \"${}\" is not defined by operation \"{}\".", name, op),
            None => format!("Variable \"${}\" is not defined.", name),
        };
        validation(message, pos)
    }

    /// Resolves a value in a position of non-null scalar type `expected`.
    ///
    /// `describe` names the position for error messages, e.g.
    /// `Argument "question" of non-null type "String!"`.
    fn resolve_scalar(
        &mut self,
        expected: &str,
        describe: &str,
        value: &Value<'_, String>,
        pos: Pos,
    ) -> Option<Json> {
        match value {
            Value::Variable(name) => {
                self.used.insert(name.clone());
                let Some(definition) = self.definitions.get(name.as_str()).copied() else {
                    let err = self.undefined_variable(name, pos);
                    self.errors.push(err);
                    return None;
                };

                let allowed = match &definition.var_type {
                    Type::NonNullType(inner) => {
                        matches!(inner.as_ref(), Type::NamedType(n) if n == expected)
                    }
                    Type::NamedType(n) => {
                        n == expected
                            && matches!(&definition.default_value, Some(v) if !matches!(v, Value::Null))
                    }
                    Type::ListType(_) => false,
                };
                if !allowed {
                    self.errors.push(validation(
                        format!(
                            "Variable \"${}\" of type \"{}\" used in position expecting type \"{}!\".",
                            name, definition.var_type, expected
                        ),
                        pos,
                    ));
                    return None;
                }

                if self.invalid.contains(name.as_str()) {
                    return None;
                }
                match self.values.get(name.as_str()) {
                    Some(value) if !value.is_null() => Some(value.clone()),
                    _ => {
                        self.errors
                            .push(bad_input(format!("{} must not be null.", describe), pos));
                        None
                    }
                }
            }
            Value::Null => {
                self.errors.push(validation(
                    format!("Expected value of type \"{}!\", found null.", expected),
                    pos,
                ));
                None
            }
            Value::Enum(_) | Value::List(_) | Value::Object(_) => {
                self.errors.push(validation(
                    format!(
                        "{} cannot represent a non {} value: {}",
                        expected,
                        expected.to_lowercase(),
                        value
                    ),
                    pos,
                ));
                None
            }
            literal => {
                let json = literal_to_json(literal).unwrap_or(Json::Null);
                match coerce_scalar(expected, &json) {
                    Ok(json) => Some(json),
                    Err(reason) => {
                        self.errors.push(validation(reason, pos));
                        None
                    }
                }
            }
        }
    }

    /// Evaluates `@skip` and `@include`; false when the field is excluded
    fn is_included(&mut self, directives: &[Directive<'_, String>]) -> bool {
        let mut included = true;
        let mut seen = HashSet::new();

        for directive in directives {
            let name = directive.name.as_str();
            if name != "skip" && name != "include" {
                self.errors.push(validation(
                    format!("Unknown directive \"@{}\".", name),
                    directive.position,
                ));
                continue;
            }
            if !seen.insert(name) {
                self.errors.push(validation(
                    format!("The directive \"@{}\" can only be used once at this location.", name),
                    directive.position,
                ));
                continue;
            }

            for (arg, _) in &directive.arguments {
                if arg != "if" {
                    self.errors.push(validation(
                        format!("Unknown argument \"{}\" on directive \"@{}\".", arg, name),
                        directive.position,
                    ));
                }
            }

            let Some((_, condition)) = directive.arguments.iter().find(|(arg, _)| arg == "if")
            else {
                self.errors.push(validation(
                    format!(
                        "Directive \"@{}\" argument \"if\" of type \"Boolean!\" is required, but it was not provided.",
                        name
                    ),
                    directive.position,
                ));
                continue;
            };

            let describe = format!("Argument \"if\" of non-null type \"Boolean!\" on \"@{}\"", name);
            if let Some(Json::Bool(flag)) =
                self.resolve_scalar("Boolean", &describe, condition, directive.position)
            {
                let keep = if name == "skip" { !flag } else { flag };
                included &= keep;
            }
        }

        included
    }

    /// Fields of a selection set; fragments are reported and dropped
    fn fields_of(&mut self, selection_set: &'d SelectionSet<'a, String>) -> Vec<&'d Field<'a, String>> {
        let mut fields = Vec::new();
        for selection in &selection_set.items {
            match selection {
                Selection::Field(field) => fields.push(field),
                Selection::FragmentSpread(spread) => {
                    self.errors.push(fragments_unsupported(spread.position))
                }
                Selection::InlineFragment(fragment) => {
                    self.errors.push(fragments_unsupported(fragment.position))
                }
            }
        }
        fields
    }

    fn reject_arguments(&mut self, field: &Field<'_, String>, parent: &str) {
        for (arg, _) in &field.arguments {
            self.errors.push(validation(
                format!("Unknown argument \"{}\" on field \"{}.{}\".", arg, parent, field.name),
                field.position,
            ));
        }
    }

    fn reject_selection(&mut self, field: &Field<'_, String>, type_name: &str) {
        if !field.selection_set.items.is_empty() {
            self.errors.push(validation(
                format!(
                    "Field \"{}\" must not have a selection since type \"{}\" has no subfields.",
                    field.name, type_name
                ),
                field.position,
            ));
        }
    }

    fn require_selection(&mut self, field: &'d Field<'a, String>, type_name: &str) -> Option<Projection> {
        if field.selection_set.items.is_empty() {
            self.errors.push(validation(
                format!(
                    "Field \"{}\" of type \"{}\" must have a selection of subfields. Did you mean \"{} {{ ... }}\"?",
                    field.name, type_name, field.name
                ),
                field.position,
            ));
            return None;
        }
        Some(self.plan_projection(&field.selection_set))
    }

    fn plan_projection(&mut self, selection_set: &'d SelectionSet<'a, String>) -> Projection {
        let mut projection = Projection::default();
        for field in self.fields_of(selection_set) {
            let included = self.is_included(&field.directives);
            let Some(kind) = QuestionField::from_name(&field.name) else {
                self.errors.push(validation(
                    format!("Cannot query field \"{}\" on type \"{}\".", field.name, QUESTION_TYPE),
                    field.position,
                ));
                continue;
            };
            self.reject_arguments(field, QUESTION_TYPE);
            self.reject_selection(field, question_field_type(&field.name).unwrap_or("String!"));
            if included {
                projection.insert(response_key(field), kind, field.position, &mut self.errors);
            }
        }
        projection
    }

    fn plan_root(&mut self, selection_set: &'d SelectionSet<'a, String>) -> Vec<(String, RootField)> {
        let root_type = match self.operation.kind {
            OperationType::Mutation => MUTATION_TYPE,
            _ => QUERY_TYPE,
        };

        let mut planned: Vec<(String, RootField)> = Vec::new();
        for field in self.fields_of(selection_set) {
            let included = self.is_included(&field.directives);
            let resolved = match (root_type, field.name.as_str()) {
                (_, TYPENAME_FIELD) => {
                    self.reject_arguments(field, root_type);
                    self.reject_selection(field, "String!");
                    Some(RootField::Typename(root_type))
                }
                (QUERY_TYPE, QUESTIONS_FIELD) => {
                    self.reject_arguments(field, root_type);
                    self.require_selection(field, "[Question!]!")
                        .map(RootField::Questions)
                }
                (MUTATION_TYPE, ASK_QUESTION_FIELD) => self.plan_ask_question(field),
                (_, name) => {
                    self.errors.push(validation(
                        format!("Cannot query field \"{}\" on type \"{}\".", name, root_type),
                        field.position,
                    ));
                    None
                }
            };

            if let (true, Some(resolved)) = (included, resolved) {
                self.merge_root(&mut planned, field, resolved);
            }
        }
        planned
    }

    fn plan_ask_question(&mut self, field: &'d Field<'a, String>) -> Option<RootField> {
        let mut seen = HashSet::new();
        for (arg, _) in &field.arguments {
            if arg != QUESTION_ARG {
                self.errors.push(validation(
                    format!(
                        "Unknown argument \"{}\" on field \"{}.{}\".",
                        arg, MUTATION_TYPE, field.name
                    ),
                    field.position,
                ));
            } else if !seen.insert(arg.as_str()) {
                self.errors.push(validation(
                    format!("There can be only one argument named \"{}\".", arg),
                    field.position,
                ));
            }
        }

        let argument = field
            .arguments
            .iter()
            .find(|(arg, _)| arg == QUESTION_ARG)
            .map(|(_, value)| value);
        let question = match argument {
            Some(value) => {
                let describe = format!("Argument \"{}\" of non-null type \"String!\"", QUESTION_ARG);
                self.resolve_scalar("String", &describe, value, field.position)
            }
            None => {
                self.errors.push(validation(
                    format!(
                        "Field \"{}\" argument \"{}\" of type \"String!\" is required, but it was not provided.",
                        field.name, QUESTION_ARG
                    ),
                    field.position,
                ));
                None
            }
        };

        let projection = self.require_selection(field, "Question!");

        match (question, projection) {
            (Some(Json::String(question)), Some(projection)) => Some(RootField::AskQuestion {
                question,
                projection,
            }),
            _ => None,
        }
    }

    fn merge_root(
        &mut self,
        planned: &mut Vec<(String, RootField)>,
        field: &Field<'_, String>,
        resolved: RootField,
    ) {
        let key = response_key(field);
        let Some(index) = planned.iter().position(|(k, _)| k == key) else {
            // One write per request keeps a mutation all-or-nothing
            let writes_already = planned
                .iter()
                .any(|(_, f)| matches!(f, RootField::AskQuestion { .. }));
            if writes_already && matches!(resolved, RootField::AskQuestion { .. }) {
                self.errors.push(validation(
                    format!(
                        "Only one \"{}\" field may be selected per mutation; send each question in its own request.",
                        ASK_QUESTION_FIELD
                    ),
                    field.position,
                ));
                return;
            }
            planned.push((key.to_string(), resolved));
            return;
        };
        let existing = &mut planned[index].1;

        match (existing, resolved) {
            (RootField::Typename(_), RootField::Typename(_)) => {}
            (RootField::Questions(current), RootField::Questions(extra)) => {
                current.merge(extra, field.position, &mut self.errors);
            }
            (
                RootField::AskQuestion {
                    question: current_question,
                    projection: current,
                },
                RootField::AskQuestion { question, projection },
            ) => {
                if *current_question == question {
                    current.merge(projection, field.position, &mut self.errors);
                } else {
                    self.errors.push(validation(
                        format!(
                            "Fields \"{}\" conflict because they have differing arguments. Use different aliases on the fields to fetch both if this was intentional.",
                            key
                        ),
                        field.position,
                    ));
                }
            }
            (existing, resolved) => {
                let err = field_conflict(key, existing.field_name(), resolved.field_name(), field.position);
                self.errors.push(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::parse_document;
    use serde_json::json;

    fn plan(query: &str, variables: Option<Json>) -> Result<PreparedOperation, Vec<GraphQlError>> {
        let document = parse_document(query).unwrap();
        let variables = variables.map(|v| v.as_object().unwrap().clone());
        prepare(&document, None, variables.as_ref())
    }

    fn codes(errors: &[GraphQlError]) -> Vec<ErrorCode> {
        errors.iter().map(|e| e.code()).collect()
    }

    #[test]
    fn test_plans_questions_query() {
        let op = plan("{ questions { id question answer } }", None).unwrap();
        assert_eq!(op.kind, OperationType::Query);
        assert_eq!(op.fields.len(), 1);
        let (key, RootField::Questions(projection)) = &op.fields[0] else {
            panic!("expected questions field");
        };
        assert_eq!(key, "questions");
        assert_eq!(projection.keys().collect::<Vec<_>>(), vec!["id", "question", "answer"]);
    }

    #[test]
    fn test_plans_mutation_with_variable() {
        let op = plan(
            "mutation Ask($q: String!) { askQuestion(question: $q) { id answer } }",
            Some(json!({"q": "What is Rust?"})),
        )
        .unwrap();
        assert!(op.is_mutation());
        assert_eq!(op.label(), "Ask");
        match &op.fields[0].1 {
            RootField::AskQuestion { question, .. } => assert_eq!(question, "What is Rust?"),
            other => panic!("unexpected field {:?}", other),
        }
    }

    #[test]
    fn test_default_value_applies_when_variable_missing() {
        let op = plan(
            r#"mutation($q: String = "fallback") { askQuestion(question: $q) { id } }"#,
            None,
        )
        .unwrap();
        assert_eq!(
            op.fields[0].1,
            RootField::AskQuestion {
                question: "fallback".into(),
                projection: Projection {
                    fields: vec![("id".into(), QuestionField::Id)],
                },
            }
        );
    }

    #[test]
    fn test_missing_required_variable_is_bad_input() {
        let errors = plan(
            "mutation($q: String!) { askQuestion(question: $q) { id } }",
            None,
        )
        .unwrap_err();
        assert_eq!(codes(&errors), vec![ErrorCode::BadUserInput]);
        assert!(errors[0].message.contains("was not provided"));
    }

    #[test]
    fn test_null_variable_is_bad_input() {
        let errors = plan(
            "mutation($q: String!) { askQuestion(question: $q) { id } }",
            Some(json!({"q": null})),
        )
        .unwrap_err();
        assert_eq!(codes(&errors), vec![ErrorCode::BadUserInput]);
        assert!(errors[0].message.contains("must not be null"));
    }

    #[test]
    fn test_wrong_variable_type_is_bad_input() {
        let errors = plan(
            "mutation($q: String!) { askQuestion(question: $q) { id } }",
            Some(json!({"q": 42})),
        )
        .unwrap_err();
        assert_eq!(codes(&errors), vec![ErrorCode::BadUserInput]);
        assert!(errors[0].message.contains("String cannot represent"));
    }

    #[test]
    fn test_missing_argument_fails_validation() {
        let errors = plan("mutation { askQuestion { id } }", None).unwrap_err();
        assert_eq!(codes(&errors), vec![ErrorCode::GraphqlValidationFailed]);
        assert!(errors[0].message.contains("is required"));
    }

    #[test]
    fn test_null_and_mistyped_literals_fail_validation() {
        let errors = plan("mutation { askQuestion(question: null) { id } }", None).unwrap_err();
        assert_eq!(codes(&errors), vec![ErrorCode::GraphqlValidationFailed]);

        let errors = plan("mutation { askQuestion(question: 7) { id } }", None).unwrap_err();
        assert_eq!(codes(&errors), vec![ErrorCode::GraphqlValidationFailed]);

        let errors = plan("mutation { askQuestion(question: RUST) { id } }", None).unwrap_err();
        assert_eq!(codes(&errors), vec![ErrorCode::GraphqlValidationFailed]);
    }

    #[test]
    fn test_empty_string_question_is_accepted() {
        let op = plan(r#"mutation { askQuestion(question: "") { id } }"#, None).unwrap();
        assert!(matches!(&op.fields[0].1, RootField::AskQuestion { question, .. } if question.is_empty()));
    }

    #[test]
    fn test_unknown_fields_are_all_reported() {
        let errors = plan("{ questions { id text } users { id } }", None).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("\"text\" on type \"Question\""));
        assert!(errors[1].message.contains("\"users\" on type \"Query\""));
        assert!(errors[0].locations.is_some());
    }

    #[test]
    fn test_mutation_field_not_available_on_query() {
        let errors = plan(r#"{ askQuestion(question: "x") { id } }"#, None).unwrap_err();
        assert!(errors[0].message.contains("on type \"Query\""));
    }

    #[test]
    fn test_selection_rules() {
        let errors = plan("{ questions }", None).unwrap_err();
        assert!(errors[0].message.contains("must have a selection"));

        let errors = plan("{ questions { id { value } } }", None).unwrap_err();
        assert!(errors[0].message.contains("must not have a selection"));
    }

    #[test]
    fn test_fragments_are_rejected() {
        let errors = plan(
            "{ questions { ...Parts } } fragment Parts on Question { id }",
            None,
        )
        .unwrap_err();
        assert_eq!(codes(&errors), vec![ErrorCode::GraphqlValidationFailed]);
        assert!(errors[0].message.contains("Fragments are not supported"));

        let errors = plan("{ questions { ... on Question { id } } }", None).unwrap_err();
        assert_eq!(codes(&errors), vec![ErrorCode::GraphqlValidationFailed]);
    }

    #[test]
    fn test_skip_and_include() {
        let op = plan(
            "query($full: Boolean!) { questions { id answer @include(if: $full) question @skip(if: true) } }",
            Some(json!({"full": false})),
        )
        .unwrap();
        let RootField::Questions(projection) = &op.fields[0].1 else {
            panic!("expected questions field");
        };
        assert_eq!(projection.keys().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn test_skipped_mutation_field_is_not_planned() {
        let op = plan(
            r#"mutation { askQuestion(question: "x") @skip(if: true) { id } __typename }"#,
            None,
        )
        .unwrap();
        assert_eq!(op.fields.len(), 1);
        assert_eq!(op.fields[0].1, RootField::Typename(MUTATION_TYPE));
    }

    #[test]
    fn test_unknown_directive_fails_validation() {
        let errors = plan("{ questions @cached { id } }", None).unwrap_err();
        assert!(errors[0].message.contains("Unknown directive \"@cached\""));
    }

    #[test]
    fn test_variable_rules() {
        let errors = plan("query($unused: Int) { questions { id } }", None).unwrap_err();
        assert!(errors[0].message.contains("never used"));

        let errors = plan("mutation { askQuestion(question: $q) { id } }", None).unwrap_err();
        assert!(errors[0].message.contains("not defined"));

        let errors = plan(
            "mutation($q: String) { askQuestion(question: $q) { id } }",
            Some(json!({"q": "x"})),
        )
        .unwrap_err();
        assert!(errors[0].message.contains("used in position expecting type \"String!\""));

        let errors = plan("query($q: Question) { questions { id } }", None).unwrap_err();
        assert!(errors[0].message.contains("non-input type"));
    }

    #[test]
    fn test_aliases_produce_separate_keys() {
        let op = plan("{ a: questions { id } b: questions { answer } }", None).unwrap();
        let keys: Vec<&str> = op.fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_second_ask_question_field_fails_validation() {
        let errors = plan(
            r#"mutation { first: askQuestion(question: "one") { id } second: askQuestion(question: "two") { id } }"#,
            None,
        )
        .unwrap_err();
        assert_eq!(codes(&errors), vec![ErrorCode::GraphqlValidationFailed]);
        assert!(errors[0].message.contains("Only one \"askQuestion\""));
    }

    #[test]
    fn test_repeated_identical_ask_question_is_one_write() {
        let op = plan(
            r#"mutation { askQuestion(question: "one") { id } askQuestion(question: "one") { answer } }"#,
            None,
        )
        .unwrap();
        assert_eq!(op.fields.len(), 1);
    }

    #[test]
    fn test_identical_fields_merge() {
        let op = plan("{ questions { id } questions { answer id } }", None).unwrap();
        assert_eq!(op.fields.len(), 1);
        let RootField::Questions(projection) = &op.fields[0].1 else {
            panic!("expected questions field");
        };
        assert_eq!(projection.keys().collect::<Vec<_>>(), vec!["id", "answer"]);
    }

    #[test]
    fn test_conflicting_fields_fail_validation() {
        let errors = plan("{ questions { id: answer id } }", None).unwrap_err();
        assert!(errors[0].message.contains("conflict"));

        let errors = plan(
            r#"mutation { askQuestion(question: "a") { id } askQuestion(question: "b") { id } }"#,
            None,
        )
        .unwrap_err();
        assert!(errors[0].message.contains("differing arguments"));
    }

    #[test]
    fn test_operation_selection() {
        let document =
            parse_document("query A { questions { id } } query B { __typename }").unwrap();
        let op = prepare(&document, Some("B"), None).unwrap();
        assert_eq!(op.fields[0].1, RootField::Typename(QUERY_TYPE));

        let errors = prepare(&document, None, None).unwrap_err();
        assert!(errors[0].message.contains("Must provide operation name"));

        let errors = prepare(&document, Some("C"), None).unwrap_err();
        assert!(errors[0].message.contains("Unknown operation named \"C\""));
    }

    #[test]
    fn test_subscriptions_are_rejected() {
        let errors = plan("subscription { questions { id } }", None).unwrap_err();
        assert_eq!(codes(&errors), vec![ErrorCode::GraphqlValidationFailed]);
    }

    #[test]
    fn test_projection_follows_selection_order() {
        let op = plan("{ questions { answer kind: __typename id } }", None).unwrap();
        let RootField::Questions(projection) = &op.fields[0].1 else {
            panic!("expected questions field");
        };
        let record = Question {
            id: shared_types::QuestionId("1".into()),
            question: "q".into(),
            answer: "a".into(),
        };
        let projected = serde_json::to_string(&projection.project(&record)).unwrap();
        assert_eq!(projected, r#"{"answer":"a","kind":"Question","id":"1"}"#);
    }
}
