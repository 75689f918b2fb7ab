use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use swc_ecma_ast::{
    ClassMember, Expr, Lit, ParamOrTsParamProp, TsEnumDecl, TsEnumMemberId, TsKeywordType,
    TsKeywordTypeKind, TsLit, TsParamPropParam, TsTupleType, TsType, TsTypeElement,
    TsTypeOperatorOp, TsTypeParamInstantiation, TsUnionOrIntersectionType, UnaryOp,
};
use swc_ecma_quote::swc_common::{BytePos, DUMMY_SP};
use tr_core::{debug, Error, Result};
use tr_typescript::binder::annotation;
use tr_typescript::checker::prop_name;
use tr_typescript::{entity_name, prop_key_name, Program, TypeChecker, TypeDecl, TypeDeclKind};

use crate::{definition_ref, Expose, SchemaMap, SchemaOptions, SchemaResolver};

const MAX_DEPTH: usize = 32;

/// Generates schema documents from the declarations of a loaded program.
pub struct SchemaGenerator<'p> {
    program: &'p Program,
    options: SchemaOptions,
}

struct Ctx<'a> {
    root: &'a str,
    definitions: SchemaMap,
    /// Named types currently being inlined, innermost last.
    inlining: Vec<String>,
}

impl Ctx<'_> {
    fn error(&self, reason: impl Into<String>) -> Error {
        Error::schema(self.root, reason)
    }
}

struct Property {
    ty: Option<TsType>,
    optional: bool,
    doc_pos: Option<BytePos>,
}

#[derive(Default)]
struct ObjectShape {
    properties: IndexMap<String, Property>,
    index: Option<TsType>,
}

impl ObjectShape {
    fn extend(&mut self, other: ObjectShape) {
        self.properties.extend(other.properties);
        if other.index.is_some() {
            self.index = other.index;
        }
    }
}

impl SchemaResolver for SchemaGenerator<'_> {
    fn schema_for(&self, type_name: &str) -> Result<SchemaMap> {
        let mut ctx = Ctx {
            root: type_name,
            definitions: SchemaMap::new(),
            inlining: Vec::new(),
        };
        self.define(&mut ctx, type_name)?;
        debug!(
            "generated {} definition(s) for {}",
            ctx.definitions.len(),
            type_name
        );
        Ok(ctx.definitions)
    }
}

impl<'p> SchemaGenerator<'p> {
    pub fn new(program: &'p Program, options: SchemaOptions) -> Self {
        Self { program, options }
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    fn checker(&self) -> &'p TypeChecker {
        self.program.checker()
    }

    fn find(&self, ctx: &Ctx, name: &str) -> Result<&'p TypeDecl> {
        self.checker()
            .find_type_decl(name)
            .ok_or_else(|| ctx.error(format!("cannot find a declaration named `{name}`")))
    }

    fn exposes(&self, decl: &TypeDecl) -> bool {
        match self.options.expose {
            Expose::All => true,
            Expose::None => false,
            Expose::Export => decl.exported,
        }
    }

    fn define(&self, ctx: &mut Ctx, name: &str) -> Result<()> {
        if ctx.definitions.contains_key(name) {
            return Ok(());
        }
        let decl = self.find(ctx, name)?;
        // placeholder keeps definition order and stops `$ref` recursion
        ctx.definitions.insert(name.to_string(), Value::Null);
        ctx.inlining.push(name.to_string());
        let schema = self.decl_schema(ctx, decl);
        ctx.inlining.pop();
        ctx.definitions.insert(name.to_string(), schema?);
        Ok(())
    }

    fn reference(
        &self,
        ctx: &mut Ctx,
        name: &str,
        type_args: Option<&TsTypeParamInstantiation>,
    ) -> Result<Value> {
        let args: Vec<&TsType> = type_args
            .map(|args| args.params.iter().map(|param| &**param).collect())
            .unwrap_or_default();
        match (name, args.as_slice()) {
            ("Array" | "ReadonlyArray", [item]) => {
                return Ok(json!({ "type": "array", "items": self.schema_of(ctx, item)? }));
            }
            ("Record", [key, value]) => return self.record(ctx, key, value),
            ("Date", []) => return Ok(json!({ "type": "string", "format": "date-time" })),
            _ => {}
        }
        if !args.is_empty() {
            return Err(ctx.error(format!("generic type `{name}<..>` is not supported")));
        }

        let decl = self.find(ctx, name)?;
        if self.exposes(decl) {
            self.define(ctx, name)?;
            return Ok(json!({ "$ref": definition_ref(name) }));
        }
        if ctx.inlining.iter().any(|inlined| inlined == name) {
            return Err(ctx.error(format!(
                "`{name}` refers to itself and cannot be inlined"
            )));
        }
        ctx.inlining.push(name.to_string());
        let schema = self.decl_schema(ctx, decl);
        ctx.inlining.pop();
        schema
    }

    fn decl_schema(&self, ctx: &mut Ctx, decl: &TypeDecl) -> Result<Value> {
        let mut schema = match &decl.kind {
            TypeDeclKind::Interface(_) | TypeDeclKind::Class(_) => {
                let shape = self
                    .decl_shape(ctx, decl, 0)?
                    .ok_or_else(|| ctx.error(format!("`{}` is not an object type", decl.name)))?;
                self.object_schema(ctx, shape)?
            }
            TypeDeclKind::Alias(alias) => {
                if alias.type_params.is_some() {
                    return Err(generic_error(ctx, &decl.name));
                }
                self.schema_of(ctx, &alias.type_ann)?
            }
            TypeDeclKind::Enum(decl) => self.enum_schema(ctx, decl)?,
        };
        self.describe(&mut schema, decl.doc_pos);
        Ok(schema)
    }

    fn decl_shape(
        &self,
        ctx: &mut Ctx,
        decl: &TypeDecl,
        depth: usize,
    ) -> Result<Option<ObjectShape>> {
        if depth > MAX_DEPTH {
            return Err(ctx.error(format!("inheritance of `{}` is too deep", decl.name)));
        }
        let mut shape = ObjectShape::default();
        match &decl.kind {
            TypeDeclKind::Interface(_) => {
                for part in self.checker().merged_decls(decl) {
                    let TypeDeclKind::Interface(interface) = &part.kind else {
                        continue;
                    };
                    if interface.type_params.is_some() {
                        return Err(generic_error(ctx, &decl.name));
                    }
                    for heritage in &interface.extends {
                        if heritage.type_args.is_some() {
                            return Err(generic_error(ctx, &decl.name));
                        }
                        let base = self.base_shape(ctx, &heritage.expr, depth)?;
                        shape.extend(base);
                    }
                    self.collect_elements(ctx, &interface.body.body, &mut shape)?;
                }
            }
            TypeDeclKind::Class(class) => {
                if class.type_params.is_some() {
                    return Err(generic_error(ctx, &decl.name));
                }
                if let Some(super_class) = &class.super_class {
                    let base = self.base_shape(ctx, super_class, depth)?;
                    shape.extend(base);
                }
                collect_class_members(ctx, &class.body, &mut shape)?;
            }
            TypeDeclKind::Alias(alias) => {
                if alias.type_params.is_some() {
                    return Err(generic_error(ctx, &decl.name));
                }
                return self.type_shape(ctx, &alias.type_ann, depth + 1);
            }
            TypeDeclKind::Enum(_) => return Ok(None),
        }
        Ok(Some(shape))
    }

    fn base_shape(&self, ctx: &mut Ctx, expr: &Expr, depth: usize) -> Result<ObjectShape> {
        let name = match expr {
            Expr::Ident(ident) => ident.sym.to_string(),
            Expr::Member(member) => match member.prop.as_ident() {
                Some(prop) => prop.sym.to_string(),
                None => return Err(ctx.error("computed base type")),
            },
            _ => return Err(ctx.error("unsupported base type expression")),
        };
        let decl = self.find(ctx, &name)?;
        self.decl_shape(ctx, decl, depth + 1)?
            .ok_or_else(|| ctx.error(format!("base type `{name}` is not an object type")))
    }

    fn type_shape(&self, ctx: &mut Ctx, ty: &TsType, depth: usize) -> Result<Option<ObjectShape>> {
        if depth > MAX_DEPTH {
            return Ok(None);
        }
        match ty {
            TsType::TsTypeLit(lit) => {
                let mut shape = ObjectShape::default();
                self.collect_elements(ctx, &lit.members, &mut shape)?;
                Ok(Some(shape))
            }
            TsType::TsParenthesizedType(paren) => self.type_shape(ctx, &paren.type_ann, depth + 1),
            TsType::TsTypeRef(reference) if reference.type_params.is_none() => {
                match self.checker().find_type_decl(&entity_name(&reference.type_name)) {
                    Some(decl) => self.decl_shape(ctx, decl, depth + 1),
                    None => Ok(None),
                }
            }
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(
                intersection,
            )) => {
                let mut shape = ObjectShape::default();
                for part in &intersection.types {
                    match self.type_shape(ctx, part, depth + 1)? {
                        Some(part) => shape.extend(part),
                        None => return Ok(None),
                    }
                }
                Ok(Some(shape))
            }
            _ => Ok(None),
        }
    }

    fn collect_elements(
        &self,
        ctx: &Ctx,
        elements: &[TsTypeElement],
        shape: &mut ObjectShape,
    ) -> Result<()> {
        for element in elements {
            match element {
                TsTypeElement::TsPropertySignature(prop) => {
                    let name = (!prop.computed)
                        .then(|| prop_key_name(&prop.key))
                        .flatten()
                        .ok_or_else(|| ctx.error("computed property keys are not supported"))?;
                    shape.properties.insert(
                        name,
                        Property {
                            ty: annotation(&prop.type_ann).map(|ty| *ty),
                            optional: prop.optional,
                            doc_pos: Some(prop.span.lo),
                        },
                    );
                }
                TsTypeElement::TsIndexSignature(index) => {
                    shape.index = Some(
                        annotation(&index.type_ann)
                            .map(|ty| *ty)
                            .unwrap_or_else(any_type),
                    );
                }
                TsTypeElement::TsMethodSignature(method) => {
                    let name = prop_key_name(&method.key).unwrap_or_default();
                    return Err(ctx.error(format!(
                        "method `{name}` cannot be represented in JSON Schema"
                    )));
                }
                TsTypeElement::TsCallSignatureDecl(_)
                | TsTypeElement::TsConstructSignatureDecl(_) => {
                    return Err(ctx.error(
                        "call and construct signatures cannot be represented in JSON Schema",
                    ));
                }
                _ => return Err(ctx.error("accessor members are not supported")),
            }
        }
        Ok(())
    }

    fn object_schema(&self, ctx: &mut Ctx, shape: ObjectShape) -> Result<Value> {
        let mut entries: Vec<(String, Property)> = shape.properties.into_iter().collect();
        if self.options.sort_props {
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let mut properties = Map::new();
        let mut required = Vec::new();
        for (name, prop) in entries {
            let (ty, optional) = match prop.ty {
                Some(ty) => {
                    let (ty, had_undefined) = without_undefined(ty);
                    (Some(ty), prop.optional || had_undefined)
                }
                None => (None, prop.optional),
            };
            let mut schema = match &ty {
                Some(ty) => self.schema_of(ctx, ty)?,
                None => json!({}),
            };
            if let Some(pos) = prop.doc_pos {
                self.describe(&mut schema, pos);
            }
            if !optional {
                required.push(Value::String(name.clone()));
            }
            properties.insert(name, schema);
        }

        let mut object = Map::new();
        object.insert("type".into(), json!("object"));
        if !properties.is_empty() {
            object.insert("properties".into(), Value::Object(properties));
        }
        if !required.is_empty() {
            object.insert("required".into(), Value::Array(required));
        }
        let additional = match &shape.index {
            Some(ty) => self.schema_of(ctx, ty)?,
            None => Value::Bool(self.options.additional_properties),
        };
        object.insert("additionalProperties".into(), additional);
        Ok(Value::Object(object))
    }

    fn schema_of(&self, ctx: &mut Ctx, ty: &TsType) -> Result<Value> {
        match ty {
            TsType::TsKeywordType(keyword) => keyword_schema(ctx, keyword.kind),
            TsType::TsLitType(lit) => literal_schema(ctx, &lit.lit),
            TsType::TsArrayType(array) => {
                Ok(json!({ "type": "array", "items": self.schema_of(ctx, &array.elem_type)? }))
            }
            TsType::TsTupleType(tuple) => self.tuple(ctx, tuple),
            TsType::TsTypeLit(lit) => {
                let mut shape = ObjectShape::default();
                self.collect_elements(ctx, &lit.members, &mut shape)?;
                self.object_schema(ctx, shape)
            }
            TsType::TsParenthesizedType(paren) => self.schema_of(ctx, &paren.type_ann),
            TsType::TsOptionalType(optional) => self.schema_of(ctx, &optional.type_ann),
            TsType::TsTypeOperator(operator)
                if matches!(operator.op, TsTypeOperatorOp::ReadOnly) =>
            {
                self.schema_of(ctx, &operator.type_ann)
            }
            TsType::TsTypeRef(reference) => self.reference(
                ctx,
                &entity_name(&reference.type_name),
                reference.type_params.as_deref(),
            ),
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
                let mut members = Vec::new();
                for member in &union.types {
                    flatten_union(member, &mut members);
                }
                self.union(ctx, members)
            }
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(
                intersection,
            )) => match self.type_shape(ctx, ty, 0)? {
                Some(shape) => self.object_schema(ctx, shape),
                None => {
                    let parts = intersection
                        .types
                        .iter()
                        .map(|part| self.schema_of(ctx, part))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(json!({ "allOf": parts }))
                }
            },
            TsType::TsFnOrConstructorType(_) => Err(ctx.error(
                "function and constructor types cannot be represented in JSON Schema",
            )),
            other => Err(ctx.error(format!("{} is not supported", type_syntax_name(other)))),
        }
    }

    fn union(&self, ctx: &mut Ctx, mut members: Vec<&TsType>) -> Result<Value> {
        members.retain(|member| !is_undefined(member));
        match members.as_slice() {
            [] => return Ok(json!({ "not": {} })),
            [single] => return self.schema_of(ctx, single),
            _ => {}
        }

        let literals: Option<Vec<(&'static str, Value)>> =
            members.iter().map(|member| literal_value(member)).collect();
        if let Some(literals) = literals {
            let types = unique(literals.iter().map(|(ty, _)| *ty));
            let values: Vec<Value> = literals.into_iter().map(|(_, value)| value).collect();
            return Ok(json!({ "type": type_value(types), "enum": values }));
        }

        let primitives: Option<Vec<&'static str>> =
            members.iter().map(|member| primitive_name(member)).collect();
        if let Some(primitives) = primitives {
            return Ok(json!({ "type": type_value(unique(primitives.into_iter())) }));
        }

        let any_of = members
            .into_iter()
            .map(|member| self.schema_of(ctx, member))
            .collect::<Result<Vec<_>>>()?;
        Ok(json!({ "anyOf": any_of }))
    }

    fn tuple(&self, ctx: &mut Ctx, tuple: &TsTupleType) -> Result<Value> {
        let mut items = Vec::new();
        let mut min_items = 0;
        let mut rest = None;
        for element in &tuple.elem_types {
            match &*element.ty {
                TsType::TsRestType(rest_type) => {
                    let item = match &*rest_type.type_ann {
                        TsType::TsArrayType(array) => &*array.elem_type,
                        other => other,
                    };
                    rest = Some(self.schema_of(ctx, item)?);
                }
                TsType::TsOptionalType(optional) => {
                    items.push(self.schema_of(ctx, &optional.type_ann)?)
                }
                other => {
                    items.push(self.schema_of(ctx, other)?);
                    min_items = items.len();
                }
            }
        }

        let mut schema = Map::new();
        schema.insert("type".into(), json!("array"));
        let max_items = items.len();
        if !items.is_empty() {
            schema.insert("items".into(), Value::Array(items));
        }
        schema.insert("minItems".into(), json!(min_items));
        match rest {
            Some(rest) => {
                schema.insert("additionalItems".into(), rest);
            }
            None => {
                schema.insert("maxItems".into(), json!(max_items));
            }
        }
        Ok(Value::Object(schema))
    }

    fn record(&self, ctx: &mut Ctx, key: &TsType, value: &TsType) -> Result<Value> {
        if let Some("string" | "number") = primitive_name(key) {
            return Ok(json!({
                "type": "object",
                "additionalProperties": self.schema_of(ctx, value)?,
            }));
        }

        let mut keys = Vec::new();
        flatten_union(key, &mut keys);
        let mut properties = Map::new();
        let mut required = Vec::new();
        for key in keys {
            let Some(("string", Value::String(name))) = literal_value(key) else {
                return Err(ctx.error("`Record` keys must be string, number or string literals"));
            };
            properties.insert(name.clone(), self.schema_of(ctx, value)?);
            required.push(Value::String(name));
        }
        Ok(json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        }))
    }

    fn enum_schema(&self, ctx: &Ctx, decl: &TsEnumDecl) -> Result<Value> {
        let mut values = Vec::with_capacity(decl.members.len());
        let mut next = 0.0;
        for member in &decl.members {
            let value = match member.init.as_deref() {
                None => {
                    let value = number(next);
                    next += 1.0;
                    value
                }
                Some(Expr::Lit(Lit::Str(s))) => Value::String(s.value.to_string()),
                Some(expr) => match const_number(expr) {
                    Some(n) => {
                        next = n + 1.0;
                        number(n)
                    }
                    None => {
                        let name = match &member.id {
                            TsEnumMemberId::Ident(ident) => ident.sym.to_string(),
                            TsEnumMemberId::Str(s) => s.value.to_string(),
                        };
                        return Err(ctx.error(format!(
                            "enum member `{name}` has a computed value"
                        )));
                    }
                },
            };
            values.push(value);
        }
        let types = unique(values.iter().map(|value| match value {
            Value::String(_) => "string",
            _ => "number",
        }));
        Ok(json!({ "type": type_value(types), "enum": values }))
    }

    fn describe(&self, schema: &mut Value, pos: BytePos) {
        if !self.options.jsdoc {
            return;
        }
        if let (Value::Object(map), Some(description)) = (schema, self.program.jsdoc(pos)) {
            map.insert("description".into(), Value::String(description));
        }
    }
}

fn collect_class_members(ctx: &Ctx, members: &[ClassMember], shape: &mut ObjectShape) -> Result<()> {
    for member in members {
        match member {
            ClassMember::ClassProp(prop) if !prop.is_static => {
                let name = prop_name(&prop.key)
                    .ok_or_else(|| ctx.error("computed property keys are not supported"))?;
                shape.properties.insert(
                    name,
                    Property {
                        ty: annotation(&prop.type_ann).map(|ty| *ty),
                        optional: prop.is_optional,
                        doc_pos: Some(prop.span.lo),
                    },
                );
            }
            ClassMember::Constructor(ctor) => {
                for param in &ctor.params {
                    let ParamOrTsParamProp::TsParamProp(prop) = param else {
                        continue;
                    };
                    if let TsParamPropParam::Ident(binding) = &prop.param {
                        shape.properties.insert(
                            binding.id.sym.to_string(),
                            Property {
                                ty: annotation(&binding.type_ann).map(|ty| *ty),
                                optional: binding.id.optional,
                                doc_pos: Some(prop.span.lo),
                            },
                        );
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn generic_error(ctx: &Ctx, name: &str) -> Error {
    ctx.error(format!("generic type `{name}` is not supported"))
}

fn keyword_schema(ctx: &Ctx, kind: TsKeywordTypeKind) -> Result<Value> {
    use TsKeywordTypeKind::*;
    let schema = match kind {
        TsStringKeyword => json!({ "type": "string" }),
        TsNumberKeyword => json!({ "type": "number" }),
        TsBooleanKeyword => json!({ "type": "boolean" }),
        TsNullKeyword => json!({ "type": "null" }),
        TsObjectKeyword => json!({ "type": "object" }),
        TsAnyKeyword | TsUnknownKeyword => json!({}),
        TsUndefinedKeyword | TsVoidKeyword => json!({ "not": {} }),
        TsSymbolKeyword => return Err(ctx.error("`symbol` cannot be represented in JSON Schema")),
        TsBigIntKeyword => return Err(ctx.error("`bigint` cannot be represented in JSON Schema")),
        TsNeverKeyword => return Err(ctx.error("`never` cannot be represented in JSON Schema")),
        TsIntrinsicKeyword => return Err(ctx.error("intrinsic types are not supported")),
    };
    Ok(schema)
}

fn literal_schema(ctx: &Ctx, lit: &TsLit) -> Result<Value> {
    match lit {
        TsLit::Str(s) => Ok(json!({ "type": "string", "const": s.value.to_string() })),
        TsLit::Number(n) => Ok(json!({ "type": "number", "const": number(n.value) })),
        TsLit::Bool(b) => Ok(json!({ "type": "boolean", "const": b.value })),
        TsLit::Tpl(_) => Ok(json!({ "type": "string" })),
        TsLit::BigInt(_) => Err(ctx.error("`bigint` literals cannot be represented in JSON Schema")),
    }
}

fn literal_value(ty: &TsType) -> Option<(&'static str, Value)> {
    match ty {
        TsType::TsLitType(lit) => match &lit.lit {
            TsLit::Str(s) => Some(("string", Value::String(s.value.to_string()))),
            TsLit::Number(n) => Some(("number", number(n.value))),
            TsLit::Bool(b) => Some(("boolean", Value::Bool(b.value))),
            _ => None,
        },
        TsType::TsKeywordType(TsKeywordType {
            kind: TsKeywordTypeKind::TsNullKeyword,
            ..
        }) => Some(("null", Value::Null)),
        _ => None,
    }
}

fn primitive_name(ty: &TsType) -> Option<&'static str> {
    match ty {
        TsType::TsKeywordType(keyword) => match keyword.kind {
            TsKeywordTypeKind::TsStringKeyword => Some("string"),
            TsKeywordTypeKind::TsNumberKeyword => Some("number"),
            TsKeywordTypeKind::TsBooleanKeyword => Some("boolean"),
            TsKeywordTypeKind::TsNullKeyword => Some("null"),
            _ => None,
        },
        _ => None,
    }
}

fn is_undefined(ty: &TsType) -> bool {
    matches!(
        ty,
        TsType::TsKeywordType(TsKeywordType {
            kind: TsKeywordTypeKind::TsUndefinedKeyword,
            ..
        })
    )
}

fn flatten_union<'a>(ty: &'a TsType, out: &mut Vec<&'a TsType>) {
    match ty {
        TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
            for member in &union.types {
                flatten_union(member, out);
            }
        }
        TsType::TsParenthesizedType(paren) => flatten_union(&paren.type_ann, out),
        other => out.push(other),
    }
}

/// Splits `undefined` out of a property type; its presence makes the
/// property optional.
fn without_undefined(ty: TsType) -> (TsType, bool) {
    match ty {
        TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(mut union))
            if union.types.iter().any(|member| is_undefined(member))
                && !union.types.iter().all(|member| is_undefined(member)) =>
        {
            union.types.retain(|member| !is_undefined(member));
            let ty = if union.types.len() == 1 {
                *union.types.remove(0)
            } else {
                TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union))
            };
            (ty, true)
        }
        other => (other, false),
    }
}

fn any_type() -> TsType {
    TsType::TsKeywordType(TsKeywordType {
        span: DUMMY_SP,
        kind: TsKeywordTypeKind::TsAnyKeyword,
    })
}

fn const_number(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Lit(Lit::Num(n)) => Some(n.value),
        Expr::Paren(paren) => const_number(&paren.expr),
        Expr::Unary(unary) if unary.op == UnaryOp::Minus => const_number(&unary.arg).map(|n| -n),
        _ => None,
    }
}

fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn unique(names: impl Iterator<Item = &'static str>) -> Vec<&'static str> {
    let mut out = Vec::new();
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

fn type_value(types: Vec<&'static str>) -> Value {
    match types.as_slice() {
        [single] => json!(single),
        _ => json!(types),
    }
}

fn type_syntax_name(ty: &TsType) -> &'static str {
    match ty {
        TsType::TsTypeQuery(_) => "`typeof` type query",
        TsType::TsConditionalType(_) => "conditional type",
        TsType::TsMappedType(_) => "mapped type",
        TsType::TsIndexedAccessType(_) => "indexed access type",
        TsType::TsTypeOperator(_) => "type operator",
        TsType::TsInferType(_) => "`infer` type",
        TsType::TsImportType(_) => "import type",
        TsType::TsThisType(_) => "`this` type",
        TsType::TsTypePredicate(_) => "type predicate",
        TsType::TsRestType(_) => "rest type",
        _ => "this type syntax",
    }
}
