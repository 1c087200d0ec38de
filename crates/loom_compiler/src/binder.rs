//! Name resolution and semantic checks.
//!
//! The binder turns a parsed [`CompilationUnit`] into the type definitions of
//! a module image. Names are resolved first against the unit's own types,
//! then against the [`ReferenceSet`]: enclosing namespaces innermost first,
//! then `using` imports. References to another module are recorded as
//! [`ModuleRef::Reference`] with the module's index in the reference set.

use std::collections::{HashMap, HashSet};

use loom_common::Interner;
use loom_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use loom_lang::ast::{
    self, AccessorKind, CompilationUnit, LiteralKind, MemberKind, TypeDecl, TypeName, TypeSyntax,
};
use loom_lang::parser::SYNTAX_ERROR;
use loom_module::{
    AttributeDef, ConstValue, DebugLine, FieldDef, IdentityComparer, ModuleRef, PropertyDef,
    SetterKind, TypeDef, TypeKind, TypeRef, Visibility,
};
use loom_source::{SourceUnit, Span};

use crate::reference::{insert_namespace_prefixes, ReferenceSet, TypeLookup};

/// A type name could not be found.
pub const TYPE_NOT_FOUND: DiagnosticCode = DiagnosticCode::error(201);
/// A type name matches definitions in non-equivalent references.
pub const AMBIGUOUS_TYPE: DiagnosticCode = DiagnosticCode::error(202);
/// Two non-partial declarations share a full name.
pub const DUPLICATE_TYPE: DiagnosticCode = DiagnosticCode::error(203);
/// Two members of one type share a name.
pub const DUPLICATE_MEMBER: DiagnosticCode = DiagnosticCode::error(204);
/// The base type cannot be derived from.
pub const INVALID_BASE: DiagnosticCode = DiagnosticCode::error(205);
/// A type is its own ancestor.
pub const CIRCULAR_BASE: DiagnosticCode = DiagnosticCode::error(206);
/// An attribute names a type that does not derive from `System.Attribute`.
pub const NOT_AN_ATTRIBUTE: DiagnosticCode = DiagnosticCode::error(207);
/// A `using` directive names an unknown namespace.
pub const NAMESPACE_NOT_FOUND: DiagnosticCode = DiagnosticCode::error(208);
/// A field initializer cannot be converted to the field type.
pub const INITIALIZER_MISMATCH: DiagnosticCode = DiagnosticCode::error(209);
/// The same namespace is imported twice.
pub const DUPLICATE_USING: DiagnosticCode = DiagnosticCode::warning(201);

const OBJECT: &str = "System.Object";

/// The bound contents of a unit, ready to be lowered into a module image.
#[derive(Clone, Debug, Default)]
pub struct BoundModule {
    /// Type definitions in declaration order.
    pub types: Vec<TypeDef>,
    /// Declaration lines of every type and member.
    pub lines: Vec<DebugLine>,
}

/// Binds `unit` against `references`, reporting problems to `sink`.
pub fn bind(
    unit: &CompilationUnit,
    source: &SourceUnit,
    interner: &Interner,
    references: &ReferenceSet,
    comparer: &IdentityComparer,
    sink: &DiagnosticSink,
) -> BoundModule {
    let mut binder = Binder {
        interner,
        references,
        comparer,
        sink,
        source,
        usings: Vec::new(),
        locals: Vec::new(),
        local_index: HashMap::new(),
        local_namespaces: HashSet::new(),
    };
    binder.declare_types(unit);
    binder.collect_usings(unit);
    binder.bind_types()
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Target {
    Local(usize),
    Reference { module: usize, full_name: String },
}

enum ResolveError {
    NotFound,
    Ambiguous(String),
}

struct LocalType<'u> {
    full_name: String,
    namespace: Option<String>,
    name: String,
    decls: Vec<&'u TypeDecl>,
}

impl LocalType<'_> {
    fn first(&self) -> &TypeDecl {
        self.decls[0]
    }

    fn is_sealed(&self) -> bool {
        self.decls
            .iter()
            .any(|d| d.modifiers.is_sealed || d.modifiers.is_static)
    }
}

struct Binder<'a> {
    interner: &'a Interner,
    references: &'a ReferenceSet,
    comparer: &'a IdentityComparer,
    sink: &'a DiagnosticSink,
    source: &'a SourceUnit,
    usings: Vec<String>,
    locals: Vec<LocalType<'a>>,
    local_index: HashMap<String, usize>,
    local_namespaces: HashSet<String>,
}

impl<'a> Binder<'a> {
    fn error(&self, code: DiagnosticCode, message: impl Into<String>, span: Span) {
        self.sink.emit(Diagnostic::error(code, message, span));
    }

    fn line_of(&self, span: Span) -> u32 {
        self.source.line_col(span.start).0
    }

    // ---- declarations ----

    fn declare_types(&mut self, unit: &'a CompilationUnit) {
        for decl in &unit.types {
            let namespace = decl
                .namespace
                .as_ref()
                .map(|ns| self.interner.join(&ns.parts));
            let name = self.interner.resolve(decl.name).to_string();
            let full_name = match &namespace {
                Some(ns) => format!("{ns}.{name}"),
                None => name.clone(),
            };

            if let Some(&index) = self.local_index.get(&full_name) {
                let existing = &mut self.locals[index];
                if existing.first().modifiers.is_partial && decl.modifiers.is_partial {
                    existing.decls.push(decl);
                } else {
                    let where_ = namespace
                        .as_deref()
                        .map_or("the global namespace".to_string(), |ns| {
                            format!("namespace '{ns}'")
                        });
                    self.error(
                        DUPLICATE_TYPE,
                        format!("{where_} already contains a definition for '{name}'"),
                        decl.name_span,
                    );
                }
                continue;
            }

            if let Some(ns) = &namespace {
                insert_namespace_prefixes(&mut self.local_namespaces, ns);
            }
            self.local_index.insert(full_name.clone(), self.locals.len());
            self.locals.push(LocalType {
                full_name,
                namespace,
                name,
                decls: vec![decl],
            });
        }
    }

    fn collect_usings(&mut self, unit: &CompilationUnit) {
        for using in &unit.usings {
            let ns = self.interner.join(&using.namespace.parts);
            if self.usings.contains(&ns) {
                self.sink.emit(Diagnostic::warning(
                    DUPLICATE_USING,
                    format!("the using directive for '{ns}' appeared previously"),
                    using.span,
                ));
                continue;
            }
            if !self.references.has_namespace(&ns) && !self.local_namespaces.contains(&ns) {
                self.error(
                    NAMESPACE_NOT_FOUND,
                    format!(
                        "the type or namespace name '{ns}' could not be found \
                         (are you missing a reference?)"
                    ),
                    using.namespace.span,
                );
            }
            self.usings.push(ns);
        }
    }

    // ---- resolution ----

    fn resolve_full(&self, full_name: &str) -> Result<Option<Target>, ResolveError> {
        if let Some(&index) = self.local_index.get(full_name) {
            return Ok(Some(Target::Local(index)));
        }
        match self.references.lookup(full_name, self.comparer) {
            TypeLookup::NotFound => Ok(None),
            TypeLookup::Found { module, .. } => Ok(Some(Target::Reference {
                module,
                full_name: full_name.to_string(),
            })),
            TypeLookup::Ambiguous(ids) => {
                let ids: Vec<String> = ids.iter().map(|id| format!("'{id}'")).collect();
                Err(ResolveError::Ambiguous(format!(
                    "the type '{full_name}' exists in both {}",
                    ids.join(" and ")
                )))
            }
        }
    }

    /// Resolves a dotted `name` as seen from inside `scope`.
    fn resolve(&self, name: &str, scope: Option<&str>) -> Result<Target, ResolveError> {
        let mut scopes: Vec<&str> = Vec::new();
        if let Some(scope) = scope {
            scopes.push(scope);
            scopes.extend(scope.rmatch_indices('.').map(|(i, _)| &scope[..i]));
        }
        for prefix in &scopes {
            if let Some(target) = self.resolve_full(&format!("{prefix}.{name}"))? {
                return Ok(target);
            }
        }
        if let Some(target) = self.resolve_full(name)? {
            return Ok(target);
        }

        let mut hits: Vec<(String, Target)> = Vec::new();
        for using in &self.usings {
            let full = format!("{using}.{name}");
            if let Some(target) = self.resolve_full(&full)? {
                if !hits.iter().any(|(_, t)| *t == target) {
                    hits.push((full, target));
                }
            }
        }
        match hits.len() {
            0 => Err(ResolveError::NotFound),
            1 => Ok(hits.remove(0).1),
            _ => Err(ResolveError::Ambiguous(format!(
                "'{name}' is an ambiguous reference between '{}' and '{}'",
                hits[0].0, hits[1].0
            ))),
        }
    }

    fn report(&self, err: ResolveError, name: &str, span: Span) {
        match err {
            ResolveError::NotFound => self.error(
                TYPE_NOT_FOUND,
                format!(
                    "the type or namespace name '{name}' could not be found \
                     (are you missing a using directive or a reference?)"
                ),
                span,
            ),
            ResolveError::Ambiguous(message) => self.error(AMBIGUOUS_TYPE, message, span),
        }
    }

    fn resolve_syntax(&self, ty: &TypeSyntax, scope: Option<&str>) -> Option<Target> {
        match &ty.name {
            TypeName::Builtin(builtin) => {
                let full = builtin.full_name();
                match self.resolve_full(full) {
                    Ok(Some(target)) => Some(target),
                    Ok(None) => {
                        self.error(
                            TYPE_NOT_FOUND,
                            format!("predefined type '{full}' is not defined or imported"),
                            ty.span,
                        );
                        None
                    }
                    Err(err) => {
                        self.report(err, full, ty.span);
                        None
                    }
                }
            }
            TypeName::Named(qualified) => {
                let name = self.interner.join(&qualified.parts);
                match self.resolve(&name, scope) {
                    Ok(target) => Some(target),
                    Err(err) => {
                        self.report(err, &name, qualified.span);
                        None
                    }
                }
            }
        }
    }

    fn object_ref(&self, span: Span) -> Option<TypeRef> {
        match self.resolve_full(OBJECT) {
            Ok(Some(target)) => Some(self.type_ref(&target, false, false)),
            Ok(None) => {
                self.error(
                    TYPE_NOT_FOUND,
                    format!("predefined type '{OBJECT}' is not defined or imported"),
                    span,
                );
                None
            }
            Err(err) => {
                self.report(err, OBJECT, span);
                None
            }
        }
    }

    // ---- target queries ----

    fn full_name_of<'t>(&'t self, target: &'t Target) -> &'t str {
        match target {
            Target::Local(index) => &self.locals[*index].full_name,
            Target::Reference { full_name, .. } => full_name,
        }
    }

    fn reference_def(&self, module: usize, full_name: &str) -> Option<&TypeDef> {
        self.references
            .modules()
            .get(module)
            .and_then(|m| m.find_type(full_name))
    }

    fn kind_of(&self, target: &Target) -> TypeKind {
        match target {
            Target::Local(_) => TypeKind::Class,
            Target::Reference { module, full_name } => self
                .reference_def(*module, full_name)
                .map_or(TypeKind::Class, |def| def.kind),
        }
    }

    fn type_ref(&self, target: &Target, nullable: bool, array: bool) -> TypeRef {
        let module = match target {
            Target::Local(_) => ModuleRef::This,
            Target::Reference { module, .. } => ModuleRef::Reference(*module as u32),
        };
        TypeRef {
            module,
            full_name: self.full_name_of(target).to_string(),
            nullable,
            array,
        }
    }

    // ---- type bodies ----

    fn bind_types(&self) -> BoundModule {
        let bases: Vec<Option<Target>> = (0..self.locals.len())
            .map(|index| self.resolve_base(index))
            .collect();
        let cyclic = self.find_cycles(&bases);

        let mut attribute_memo: HashMap<usize, bool> = HashMap::new();
        let mut module = BoundModule::default();
        for (index, local) in self.locals.iter().enumerate() {
            let is_attribute =
                !cyclic.contains(&index) && self.local_is_attribute(index, &bases, &mut attribute_memo);
            let base = match (&bases[index], cyclic.contains(&index)) {
                (Some(target), false) => Some(self.type_ref(target, false, false)),
                _ => self.object_ref(local.first().name_span),
            };
            module.types.push(self.bind_type(index, base, is_attribute, &mut module.lines));
        }
        module
    }

    fn resolve_base(&self, index: usize) -> Option<Target> {
        let local = &self.locals[index];
        let scope = local.namespace.as_deref();
        let mut chosen: Option<Target> = None;

        for decl in &local.decls {
            for (position, base) in decl.bases.iter().enumerate() {
                if position > 0 {
                    self.error(
                        INVALID_BASE,
                        format!("class '{}' cannot have multiple base classes", local.name),
                        base.span,
                    );
                    continue;
                }
                let Some(target) = self.resolve_syntax(base, scope) else {
                    continue;
                };
                if base.nullable || base.array {
                    self.error(
                        INVALID_BASE,
                        format!("'{}' is not a valid base type", self.full_name_of(&target)),
                        base.span,
                    );
                    continue;
                }
                if let Some(previous) = &chosen {
                    if *previous != target {
                        self.error(
                            INVALID_BASE,
                            format!(
                                "partial declarations of '{}' must not specify different base classes",
                                local.name
                            ),
                            base.span,
                        );
                    }
                    continue;
                }
                if !self.is_derivable(&target) {
                    self.error(
                        INVALID_BASE,
                        format!(
                            "'{}' cannot derive from sealed type '{}'",
                            local.full_name,
                            self.full_name_of(&target)
                        ),
                        base.span,
                    );
                    continue;
                }
                chosen = Some(target);
            }
        }
        chosen
    }

    fn is_derivable(&self, target: &Target) -> bool {
        match target {
            Target::Local(index) => !self.locals[*index].is_sealed(),
            Target::Reference { module, full_name } => self
                .reference_def(*module, full_name)
                .is_some_and(|def| !def.is_sealed && !def.is_static && def.kind == TypeKind::Class),
        }
    }

    /// Reports every local type whose base chain returns to itself.
    fn find_cycles(&self, bases: &[Option<Target>]) -> HashSet<usize> {
        let mut cyclic = HashSet::new();
        for start in 0..self.locals.len() {
            let mut seen = HashSet::new();
            let mut current = start;
            while let Some(Target::Local(next)) = &bases[current] {
                if *next == start {
                    cyclic.insert(start);
                    let local = &self.locals[start];
                    self.error(
                        CIRCULAR_BASE,
                        format!(
                            "circular base type dependency involving '{}'",
                            local.full_name
                        ),
                        local.first().name_span,
                    );
                    break;
                }
                if !seen.insert(*next) {
                    break;
                }
                current = *next;
            }
        }
        cyclic
    }

    fn local_is_attribute(
        &self,
        index: usize,
        bases: &[Option<Target>],
        memo: &mut HashMap<usize, bool>,
    ) -> bool {
        if let Some(&known) = memo.get(&index) {
            return known;
        }
        // Guards against cycles through types not flagged as the cycle start.
        memo.insert(index, false);
        let result = match &bases[index] {
            None => false,
            Some(Target::Local(base)) => self.local_is_attribute(*base, bases, memo),
            Some(Target::Reference { module, full_name }) => self
                .reference_def(*module, full_name)
                .is_some_and(|def| def.is_attribute),
        };
        memo.insert(index, result);
        result
    }

    fn is_attribute_target(&self, target: &Target) -> bool {
        match target {
            Target::Local(index) => {
                let mut seen = HashSet::new();
                let mut current = *index;
                loop {
                    if !seen.insert(current) {
                        return false;
                    }
                    let local = &self.locals[current];
                    let base = local
                        .decls
                        .iter()
                        .find_map(|d| d.bases.first())
                        .and_then(|b| self.resolve_quiet(b, local.namespace.as_deref()));
                    match base {
                        Some(Target::Local(next)) => current = next,
                        Some(other) => return self.is_attribute_target(&other),
                        None => return false,
                    }
                }
            }
            Target::Reference { module, full_name } => self
                .reference_def(*module, full_name)
                .is_some_and(|def| def.is_attribute),
        }
    }

    fn resolve_quiet(&self, ty: &TypeSyntax, scope: Option<&str>) -> Option<Target> {
        match &ty.name {
            TypeName::Builtin(builtin) => self.resolve_full(builtin.full_name()).ok().flatten(),
            TypeName::Named(q) => self.resolve(&self.interner.join(&q.parts), scope).ok(),
        }
    }

    fn bind_type(
        &self,
        index: usize,
        base: Option<TypeRef>,
        is_attribute: bool,
        lines: &mut Vec<DebugLine>,
    ) -> TypeDef {
        let local = &self.locals[index];
        let scope = local.namespace.as_deref();
        let first = local.first();

        let mut visibility = None;
        for decl in &local.decls {
            if let Some(v) = decl.modifiers.visibility {
                match visibility {
                    Some(existing) if existing != v => self.error(
                        DUPLICATE_TYPE,
                        format!(
                            "partial declarations of '{}' have conflicting accessibility modifiers",
                            local.name
                        ),
                        decl.name_span,
                    ),
                    _ => visibility = Some(v),
                }
            }
        }

        lines.push(DebugLine {
            type_name: local.full_name.clone(),
            member: None,
            line: self.line_of(first.name_span),
        });

        let mut def = TypeDef {
            namespace: local.namespace.clone(),
            name: local.name.clone(),
            visibility: visibility.map_or(Visibility::Internal, lower_visibility),
            kind: TypeKind::Class,
            is_sealed: local.decls.iter().any(|d| d.modifiers.is_sealed),
            is_abstract: local.decls.iter().any(|d| d.modifiers.is_abstract),
            is_static: local.decls.iter().any(|d| d.modifiers.is_static),
            is_attribute,
            base,
            attributes: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
        };

        let mut member_names: HashSet<String> = HashSet::new();
        for decl in &local.decls {
            def.attributes
                .extend(self.bind_attributes(&decl.attributes, scope));

            for member in &decl.members {
                let name = self.interner.resolve(member.name).to_string();
                if name == local.name {
                    self.error(
                        DUPLICATE_MEMBER,
                        format!("'{name}': member names cannot be the same as their enclosing type"),
                        member.name_span,
                    );
                    continue;
                }
                if !member_names.insert(name.clone()) {
                    self.error(
                        DUPLICATE_MEMBER,
                        format!(
                            "the type '{}' already contains a definition for '{name}'",
                            local.full_name
                        ),
                        member.name_span,
                    );
                    continue;
                }

                let attributes = self.bind_attributes(&member.attributes, scope);
                let Some(target) = self.resolve_syntax(&member.ty, scope) else {
                    continue;
                };
                let ty = self.type_ref(&target, member.ty.nullable, member.ty.array);
                let visibility = member
                    .modifiers
                    .visibility
                    .map_or(Visibility::Private, lower_visibility);

                lines.push(DebugLine {
                    type_name: local.full_name.clone(),
                    member: Some(name.clone()),
                    line: self.line_of(member.name_span),
                });

                match &member.kind {
                    MemberKind::Field { initializer } => {
                        let initializer = initializer.as_ref().and_then(|lit| {
                            if self.literal_fits(&lit.kind, &target, &member.ty) {
                                Some(lower_literal(&lit.kind))
                            } else {
                                self.error(
                                    INITIALIZER_MISMATCH,
                                    format!(
                                        "cannot convert {} to type '{ty}'",
                                        describe_literal(&lit.kind)
                                    ),
                                    lit.span,
                                );
                                None
                            }
                        });
                        def.fields.push(FieldDef {
                            name,
                            visibility,
                            ty,
                            is_static: member.modifiers.is_static,
                            is_readonly: member.modifiers.is_readonly,
                            initializer,
                            attributes,
                        });
                    }
                    MemberKind::Property { accessors } => {
                        let (getter, setter) = self.check_accessors(&name, accessors, member.span);
                        def.properties.push(PropertyDef {
                            name,
                            visibility,
                            ty,
                            is_static: member.modifiers.is_static,
                            getter,
                            setter,
                            attributes,
                        });
                    }
                }
            }
        }
        def
    }

    fn check_accessors(
        &self,
        property: &str,
        accessors: &[ast::Accessor],
        span: Span,
    ) -> (bool, SetterKind) {
        if accessors.is_empty() {
            self.error(
                SYNTAX_ERROR,
                format!("property '{property}' must declare at least one accessor"),
                span,
            );
        }
        let mut getter = false;
        let mut setter = SetterKind::None;
        for accessor in accessors {
            match accessor.kind {
                AccessorKind::Get if getter => self.error(
                    DUPLICATE_MEMBER,
                    format!("property '{property}' already has a 'get' accessor"),
                    accessor.span,
                ),
                AccessorKind::Get => getter = true,
                AccessorKind::Set | AccessorKind::Init if setter != SetterKind::None => {
                    self.error(
                        DUPLICATE_MEMBER,
                        format!("property '{property}' already has a 'set' or 'init' accessor"),
                        accessor.span,
                    )
                }
                AccessorKind::Set => setter = SetterKind::Set,
                AccessorKind::Init => setter = SetterKind::Init,
            }
        }
        (getter, setter)
    }

    fn bind_attributes(&self, attributes: &[ast::Attribute], scope: Option<&str>) -> Vec<AttributeDef> {
        let mut out = Vec::new();
        for attr in attributes {
            let name = self.interner.join(&attr.name.parts);
            let target = match self.resolve(&format!("{name}Attribute"), scope) {
                Ok(target) => target,
                Err(_) => match self.resolve(&name, scope) {
                    Ok(target) => target,
                    Err(err) => {
                        self.report(err, &name, attr.name.span);
                        continue;
                    }
                },
            };
            if !self.is_attribute_target(&target) {
                self.error(
                    NOT_AN_ATTRIBUTE,
                    format!("'{}' is not an attribute class", self.full_name_of(&target)),
                    attr.name.span,
                );
                continue;
            }
            out.push(AttributeDef {
                ty: self.type_ref(&target, false, false),
                args: attr.args.iter().map(|a| lower_literal(&a.kind)).collect(),
            });
        }
        out
    }

    /// Whether a literal converts implicitly to the declared member type.
    fn literal_fits(&self, literal: &LiteralKind, target: &Target, ty: &TypeSyntax) -> bool {
        if let LiteralKind::Null = literal {
            return ty.array || ty.nullable || self.kind_of(target) == TypeKind::Class;
        }
        if ty.array {
            return false;
        }
        let full = self.full_name_of(target);
        if full == OBJECT {
            return true;
        }
        match literal {
            LiteralKind::String(_) => full == "System.String",
            LiteralKind::Bool(_) => full == "System.Boolean",
            LiteralKind::Integer(n) => match full {
                "System.Int32" => i32::try_from(*n).is_ok(),
                "System.Byte" => u8::try_from(*n).is_ok(),
                "System.Int64" | "System.Double" | "System.Single" | "System.Decimal" => true,
                _ => false,
            },
            LiteralKind::Real(text) => match text.chars().last().map(|c| c.to_ascii_lowercase()) {
                Some('m') => full == "System.Decimal",
                Some('f') => matches!(full, "System.Single" | "System.Double"),
                _ => full == "System.Double",
            },
            LiteralKind::Null => true,
        }
    }
}

fn lower_visibility(v: ast::Visibility) -> Visibility {
    match v {
        ast::Visibility::Public => Visibility::Public,
        ast::Visibility::Internal => Visibility::Internal,
        ast::Visibility::Protected => Visibility::Protected,
        ast::Visibility::Private => Visibility::Private,
    }
}

fn lower_literal(kind: &LiteralKind) -> ConstValue {
    match kind {
        LiteralKind::String(s) => ConstValue::String(s.clone()),
        LiteralKind::Integer(n) => ConstValue::Integer(*n),
        LiteralKind::Real(r) => ConstValue::Real(r.clone()),
        LiteralKind::Bool(b) => ConstValue::Bool(*b),
        LiteralKind::Null => ConstValue::Null,
    }
}

fn describe_literal(kind: &LiteralKind) -> String {
    match kind {
        LiteralKind::String(s) => format!("string literal {s:?}"),
        LiteralKind::Integer(n) => format!("integer literal {n}"),
        LiteralKind::Real(r) => format!("real literal {r}"),
        LiteralKind::Bool(b) => format!("'{b}'"),
        LiteralKind::Null => "null".to_string(),
    }
}
