//! Resolution phase: statements to [`SchemaSnapshot`].
//!
//! Statements that extend the same label are merged into one declaration.
//! Each declaration's category is derived by following its `sub` chain to a
//! built-in root, every reference is checked, and the checked declarations
//! are loaded into a snapshot with supertypes inserted before their subtypes.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, trace};

use schemaviz_core::{
    category::Category,
    snapshot::{RoleRef, SchemaSnapshot, TypeRef},
    source::SourceError,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    parser_types::{Clause, Statement},
    span::{Span, Spanned},
};

type Label<'src> = Spanned<&'src str>;

#[derive(Debug)]
struct PlaysDecl<'src> {
    relation: Label<'src>,
    role: Label<'src>,
    overridden: Option<Label<'src>>,
}

#[derive(Debug)]
struct RelatesDecl<'src> {
    role: Label<'src>,
    overridden: Option<Label<'src>>,
}

/// Everything declared about one label, across all statements.
#[derive(Debug)]
struct TypeDecl<'src> {
    label: Label<'src>,
    sub: Option<Label<'src>>,
    owns: Vec<Label<'src>>,
    owns_overrides: Vec<Label<'src>>,
    plays: Vec<PlaysDecl<'src>>,
    relates: Vec<RelatesDecl<'src>>,
    /// Spans of `value` and `regex` clauses.
    attribute_clauses: Vec<Span>,
}

impl<'src> TypeDecl<'src> {
    fn new(label: Label<'src>) -> Self {
        Self {
            label,
            sub: None,
            owns: Vec::new(),
            owns_overrides: Vec::new(),
            plays: Vec::new(),
            relates: Vec::new(),
            attribute_clauses: Vec::new(),
        }
    }
}

fn contains(labels: &[Label<'_>], label: &str) -> bool {
    labels.iter().any(|l| *l.inner() == label)
}

#[derive(Default)]
pub(crate) struct Resolver<'src> {
    decls: IndexMap<&'src str, TypeDecl<'src>>,
    categories: HashMap<&'src str, Category>,
    diagnostics: DiagnosticCollector,
}

impl<'src> Resolver<'src> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Resolve `statements` into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns every resolution diagnostic found.
    pub(crate) fn resolve(mut self, statements: &[Statement<'src>]) -> Result<SchemaSnapshot, ParseError> {
        for statement in statements {
            self.merge_statement(statement);
        }
        debug!(types = self.decls.len(); "Merged schema statements");

        self.check_supertypes();
        self.resolve_categories();
        self.check_references();

        std::mem::take(&mut self.diagnostics).finish()?;

        let snapshot = self.build_snapshot()?;
        debug!(types = snapshot.type_count(); "Resolved schema snapshot");
        Ok(snapshot)
    }

    // ========================================================================
    // Merging
    // ========================================================================

    fn merge_statement(&mut self, statement: &Statement<'src>) {
        let label = *statement.label.inner();
        if Category::from_root_label(label).is_some() {
            self.diagnostics.emit(
                Diagnostic::error(format!("built-in type `{label}` cannot be redefined"))
                    .with_code(ErrorCode::E205)
                    .with_label(statement.label.span(), "built-in type")
                    .with_help("declare a new type with `sub` instead"),
            );
            return;
        }

        trace!(label = label, clauses = statement.clauses.len(); "Merging statement");

        let mut diagnostics = Vec::new();
        let decl = self
            .decls
            .entry(label)
            .or_insert_with(|| TypeDecl::new(statement.label.clone()));

        for clause in &statement.clauses {
            match clause.inner() {
                Clause::Sub(parent) => match &decl.sub {
                    None => decl.sub = Some(parent.clone()),
                    Some(existing) if existing.inner() == parent.inner() => {}
                    Some(existing) => diagnostics.push(
                        Diagnostic::error(format!("type `{label}` declares two supertypes"))
                            .with_code(ErrorCode::E201)
                            .with_label(parent.span(), "second supertype")
                            .with_secondary_label(existing.span(), "first supertype declared here")
                            .with_help("a type has exactly one direct supertype"),
                    ),
                },
                Clause::Owns {
                    attribute,
                    overridden,
                    ..
                } => {
                    if !contains(&decl.owns, attribute.inner()) {
                        decl.owns.push(attribute.clone());
                    }
                    decl.owns_overrides.extend(overridden.iter().cloned());
                }
                Clause::Plays {
                    relation,
                    role,
                    overridden,
                } => {
                    let duplicate = decl.plays.iter().any(|p| {
                        p.relation.inner() == relation.inner() && p.role.inner() == role.inner()
                    });
                    if !duplicate {
                        decl.plays.push(PlaysDecl {
                            relation: relation.clone(),
                            role: role.clone(),
                            overridden: overridden.clone(),
                        });
                    }
                }
                Clause::Relates { role, overridden } => {
                    if !decl.relates.iter().any(|r| r.role.inner() == role.inner()) {
                        decl.relates.push(RelatesDecl {
                            role: role.clone(),
                            overridden: overridden.clone(),
                        });
                    }
                }
                Clause::Value(_) | Clause::Regex(_) => decl.attribute_clauses.push(clause.span()),
                Clause::Abstract => {}
            }
        }

        for diagnostic in diagnostics {
            self.diagnostics.emit(diagnostic);
        }
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Every declared type needs a supertype that is a root or declared.
    fn check_supertypes(&mut self) {
        let mut diagnostics = Vec::new();
        for decl in self.decls.values() {
            match &decl.sub {
                None => diagnostics.push(
                    Diagnostic::error(format!(
                        "type `{}` is never given a supertype",
                        decl.label.inner()
                    ))
                    .with_code(ErrorCode::E200)
                    .with_label(decl.label.span(), "no `sub` clause for this type")
                    .with_help("add `sub entity`, `sub attribute`, `sub relation` or `sub` an existing type"),
                ),
                Some(parent)
                    if Category::from_root_label(parent.inner()).is_none()
                        && !self.decls.contains_key(parent.inner()) =>
                {
                    diagnostics.push(undefined_type(parent));
                }
                Some(_) => {}
            }
        }
        for diagnostic in diagnostics {
            self.diagnostics.emit(diagnostic);
        }
    }

    /// Follow each `sub` chain to a root; report each cycle once.
    fn resolve_categories(&mut self) {
        let mut resolved: HashMap<&'src str, Option<Category>> = HashMap::new();

        for &label in self.decls.keys() {
            let mut chain: Vec<&'src str> = Vec::new();
            let mut current = label;

            let outcome = loop {
                if let Some(category) = Category::from_root_label(current) {
                    break Some(category);
                }
                if let Some(known) = resolved.get(current) {
                    break *known;
                }
                if let Some(start) = chain.iter().position(|l| *l == current) {
                    let diagnostic = self.cycle_diagnostic(&chain[start..]);
                    self.diagnostics.emit(diagnostic);
                    break None;
                }
                chain.push(current);
                match self.decls.get(current).and_then(|d| d.sub.as_ref()) {
                    Some(parent) => current = *parent.inner(),
                    // Missing or undefined supertypes are already reported.
                    None => break None,
                }
            };

            for member in chain {
                resolved.insert(member, outcome);
            }
        }

        self.categories = resolved
            .into_iter()
            .filter_map(|(label, category)| category.map(|c| (label, c)))
            .collect();
    }

    fn cycle_diagnostic(&self, cycle: &[&'src str]) -> Diagnostic {
        let path = cycle
            .iter()
            .chain(cycle.first())
            .copied()
            .collect::<Vec<_>>()
            .join(" -> ");

        let mut diagnostic = Diagnostic::error(format!("cyclic type hierarchy: {path}"))
            .with_code(ErrorCode::E202)
            .with_help("every supertype chain must end at `entity`, `attribute` or `relation`");
        for (i, label) in cycle.iter().enumerate() {
            if let Some(sub) = self.decls.get(label).and_then(|d| d.sub.as_ref()) {
                diagnostic = if i == 0 {
                    diagnostic.with_label(sub.span(), "cycle closes here")
                } else {
                    diagnostic.with_secondary_label(sub.span(), "part of the cycle")
                };
            }
        }
        diagnostic
    }

    /// Category of a referenced label, if it resolved.
    fn category_of(&self, label: &str) -> Option<Category> {
        self.categories.get(label).copied()
    }

    /// Walks from `relation` up its supertypes to the relation declaring `role`.
    fn declaring_relation(&self, relation: &'src str, role: &str) -> Option<&'src str> {
        let mut current = relation;
        loop {
            let decl = self.decls.get(current)?;
            if decl.relates.iter().any(|r| *r.role.inner() == role) {
                return Some(current);
            }
            current = *decl.sub.as_ref()?.inner();
            if Category::from_root_label(current).is_some() {
                return None;
            }
        }
    }

    // ========================================================================
    // References
    // ========================================================================

    fn check_references(&mut self) {
        let mut diagnostics = Vec::new();

        for decl in self.decls.values() {
            // Types in a broken hierarchy have already been reported.
            let Some(category) = self.category_of(decl.label.inner()) else {
                continue;
            };

            for attribute in decl.owns.iter().chain(&decl.owns_overrides) {
                if let Some(diagnostic) =
                    self.check_reference(attribute, Category::Attribute, "owned")
                {
                    diagnostics.push(diagnostic);
                }
            }

            if category != Category::Relation {
                for relates in &decl.relates {
                    diagnostics.push(category_mismatch(
                        &decl.label,
                        category,
                        relates.role.span(),
                        "only relation types declare roles with `relates`",
                    ));
                }
            } else {
                for relates in &decl.relates {
                    let Some(overridden) = &relates.overridden else {
                        continue;
                    };
                    let inherited = decl
                        .sub
                        .as_ref()
                        .and_then(|parent| self.declaring_relation(*parent.inner(), overridden.inner()));
                    if inherited.is_none() {
                        diagnostics.push(undefined_role(decl.label.inner(), overridden, "a supertype of"));
                    }
                }
            }

            if category != Category::Attribute {
                for span in &decl.attribute_clauses {
                    diagnostics.push(category_mismatch(
                        &decl.label,
                        category,
                        *span,
                        "`value` and `regex` are only valid on attribute types",
                    ));
                }
            }

            for plays in &decl.plays {
                if let Some(diagnostic) =
                    self.check_reference(&plays.relation, Category::Relation, "used as a relation")
                {
                    diagnostics.push(diagnostic);
                    continue;
                }
                let relation = *plays.relation.inner();
                if self.declaring_relation(relation, plays.role.inner()).is_none() {
                    diagnostics.push(undefined_role(relation, &plays.role, ""));
                }
                if let Some(overridden) = &plays.overridden {
                    let inherited = self.decls[relation]
                        .sub
                        .as_ref()
                        .and_then(|parent| self.declaring_relation(*parent.inner(), overridden.inner()));
                    if inherited.is_none() {
                        diagnostics.push(undefined_role(relation, overridden, "a supertype of"));
                    }
                }
            }
        }

        for diagnostic in diagnostics {
            self.diagnostics.emit(diagnostic);
        }
    }

    /// Check that `reference` names a declared type of `expected` category.
    fn check_reference(
        &self,
        reference: &Label<'src>,
        expected: Category,
        usage: &str,
    ) -> Option<Diagnostic> {
        let label = *reference.inner();
        if Category::from_root_label(label).is_some() {
            return Some(
                Diagnostic::error(format!("built-in type `{label}` cannot be {usage}"))
                    .with_code(ErrorCode::E205)
                    .with_label(reference.span(), "built-in type")
                    .with_help(format!("use a declared {} type", expected.root_label())),
            );
        }
        match self.decls.get(label) {
            None => Some(undefined_type(reference)),
            Some(decl) => match self.category_of(label) {
                Some(actual) if actual != expected => Some(
                    Diagnostic::error(format!(
                        "`{label}` is {} {} type and cannot be {usage}",
                        article(actual),
                        actual.root_label()
                    ))
                    .with_code(ErrorCode::E203)
                    .with_label(reference.span(), format!("expected {} type", expected.root_label()))
                    .with_secondary_label(decl.label.span(), "declared here"),
                ),
                _ => None,
            },
        }
    }

    // ========================================================================
    // Snapshot
    // ========================================================================

    fn build_snapshot(&self) -> Result<SchemaSnapshot, ParseError> {
        let mut snapshot = SchemaSnapshot::new();
        let mut handles: HashMap<&'src str, TypeRef> = HashMap::new();

        for &label in self.decls.keys() {
            self.insert_with_supertypes(&mut snapshot, &mut handles, label)
                .map_err(snapshot_error)?;
        }

        for decl in self.decls.values() {
            let owner = handles[decl.label.inner()];
            for attribute in &decl.owns {
                snapshot
                    .add_owns(owner, handles[attribute.inner()])
                    .map_err(snapshot_error)?;
            }
        }

        let mut roles: HashMap<(&'src str, &'src str), RoleRef> = HashMap::new();
        for decl in self.decls.values() {
            let relation = handles[decl.label.inner()];
            for relates in &decl.relates {
                let role = snapshot
                    .add_role(relation, *relates.role.inner())
                    .map_err(snapshot_error)?;
                roles.insert((*decl.label.inner(), *relates.role.inner()), role);
            }
        }

        for decl in self.decls.values() {
            let player = handles[decl.label.inner()];
            for plays in &decl.plays {
                let declaring = self
                    .declaring_relation(*plays.relation.inner(), plays.role.inner())
                    .ok_or_else(|| snapshot_error(SourceError::unavailable("unresolved role")))?;
                let role = roles[&(declaring, *plays.role.inner())];
                snapshot.add_player(role, player).map_err(snapshot_error)?;
            }
        }

        Ok(snapshot)
    }

    /// Insert `label` and any of its not-yet-inserted supertypes, top down.
    fn insert_with_supertypes(
        &self,
        snapshot: &mut SchemaSnapshot,
        handles: &mut HashMap<&'src str, TypeRef>,
        label: &'src str,
    ) -> Result<(), SourceError> {
        let mut pending = Vec::new();
        let mut current = label;
        let mut parent = loop {
            if let Some(category) = Category::from_root_label(current) {
                break snapshot.root(category);
            }
            if let Some(handle) = handles.get(current) {
                break *handle;
            }
            pending.push(current);
            current = self
                .decls
                .get(current)
                .and_then(|d| d.sub.as_ref())
                .map(|sub| *sub.inner())
                .ok_or_else(|| SourceError::unavailable(format!("type `{current}` has no supertype")))?;
        };

        for ty in pending.into_iter().rev() {
            parent = snapshot.add_type(ty, parent)?;
            handles.insert(ty, parent);
        }
        Ok(())
    }
}

fn article(category: Category) -> &'static str {
    match category {
        Category::Attribute | Category::Entity => "an",
        Category::Relation => "a",
    }
}

fn undefined_type(reference: &Label<'_>) -> Diagnostic {
    Diagnostic::error(format!("undefined type `{}`", reference.inner()))
        .with_code(ErrorCode::E200)
        .with_label(reference.span(), "not defined in this schema")
}

fn undefined_role(relation: &str, role: &Label<'_>, scope: &str) -> Diagnostic {
    let owner = if scope.is_empty() {
        format!("`{relation}`")
    } else {
        format!("{scope} `{relation}`")
    };
    Diagnostic::error(format!("role `{}` is not declared by {owner}", role.inner()))
        .with_code(ErrorCode::E204)
        .with_label(role.span(), "undefined role")
        .with_help(format!("declare it with `{relation} relates {}`", role.inner()))
}

fn category_mismatch(label: &Label<'_>, actual: Category, span: Span, help: &str) -> Diagnostic {
    Diagnostic::error(format!(
        "`{}` is {} {} type",
        label.inner(),
        article(actual),
        actual.root_label()
    ))
    .with_code(ErrorCode::E203)
    .with_label(span, "not allowed here")
    .with_secondary_label(label.span(), "declared here")
    .with_help(help.to_string())
}

fn snapshot_error(err: SourceError) -> ParseError {
    Diagnostic::error(format!("failed to load schema: {err}")).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer::tokenize, parser::build_statements};

    use schemaviz_core::source::TypeSource;

    fn resolve(source: &str) -> Result<SchemaSnapshot, ParseError> {
        let tokens: Vec<_> = tokenize(source)
            .expect("input should lex")
            .into_iter()
            .filter(|t| !t.token.is_trivia())
            .collect();
        let statements = build_statements(&tokens).expect("input should parse");
        Resolver::new().resolve(&statements)
    }

    fn error_codes(source: &str) -> Vec<ErrorCode> {
        resolve(source)
            .expect_err("schema should not resolve")
            .diagnostics()
            .iter()
            .filter_map(|d| d.code())
            .collect()
    }

    fn labels(schema: &SchemaSnapshot, types: Vec<TypeRef>) -> Vec<String> {
        types
            .iter()
            .map(|t| schema.type_label(t).unwrap().unwrap())
            .collect()
    }

    #[test]
    fn test_categories_follow_supertypes() {
        let schema = resolve(
            "student sub person; person sub entity; name sub attribute, value string;",
        )
        .unwrap();

        let student = schema.find_type("student").unwrap();
        assert_eq!(schema.category(student), Some(Category::Entity));
        assert_eq!(schema.supertype(student), schema.find_type("person"));
        assert_eq!(
            schema.category(schema.find_type("name").unwrap()),
            Some(Category::Attribute)
        );
    }

    #[test]
    fn test_statements_extend_existing_types() {
        let schema = resolve(
            "person sub entity, owns name;
             name sub attribute; email sub attribute;
             person owns email, owns name;",
        )
        .unwrap();

        let person = schema.find_type("person").unwrap();
        assert_eq!(
            labels(&schema, schema.owned_attributes(&person).unwrap()),
            vec!["name", "email"]
        );
    }

    #[test]
    fn test_roles_and_inherited_roles() {
        let schema = resolve(
            "person sub entity, plays employment:employee, plays contract:employee;
             employment sub relation, relates employee, relates employer;
             contract sub employment;",
        )
        .unwrap();

        let employment = schema.find_type("employment").unwrap();
        let employee = schema.find_role(employment, "employee").unwrap();
        let players = schema.role_players(&employee).unwrap();

        // Both clauses resolve to the role declared on `employment`.
        assert_eq!(labels(&schema, players), vec!["person", "person"]);
        assert!(schema.find_role(schema.find_type("contract").unwrap(), "employee").is_none());
    }

    #[test]
    fn test_sibling_order_follows_first_appearance() {
        let schema = resolve("b sub entity; a sub entity; c sub b;").unwrap();
        let root = schema.root(Category::Entity);

        assert_eq!(labels(&schema, schema.direct_subtypes(&root).unwrap()), vec!["b", "a"]);
    }

    #[test]
    fn test_undefined_types() {
        assert_eq!(error_codes("person sub animal;"), vec![ErrorCode::E200]);
        assert_eq!(error_codes("person owns name;"), vec![ErrorCode::E200]);
        assert_eq!(
            error_codes("person sub entity, owns name;"),
            vec![ErrorCode::E200]
        );
    }

    #[test]
    fn test_duplicate_supertype() {
        assert_eq!(
            error_codes("person sub entity; person sub relation;"),
            vec![ErrorCode::E201]
        );
        assert!(resolve("person sub entity; person sub entity;").is_ok());
    }

    #[test]
    fn test_cycle_reported_once() {
        let err = resolve("a sub b; b sub c; c sub a; d sub a;").unwrap_err();
        let codes: Vec<_> = err.diagnostics().iter().filter_map(|d| d.code()).collect();

        assert_eq!(codes, vec![ErrorCode::E202]);
        assert_eq!(
            err.diagnostics()[0].message(),
            "cyclic type hierarchy: a -> b -> c -> a"
        );
    }

    #[test]
    fn test_category_mismatches() {
        assert_eq!(
            error_codes("person sub entity, owns company; company sub entity;"),
            vec![ErrorCode::E203]
        );
        assert_eq!(
            error_codes("person sub entity, relates friend;"),
            vec![ErrorCode::E203]
        );
        assert_eq!(
            error_codes("person sub entity, value string;"),
            vec![ErrorCode::E203]
        );
        assert_eq!(
            error_codes("person sub entity, plays company:member; company sub entity;"),
            vec![ErrorCode::E203]
        );
    }

    #[test]
    fn test_undefined_roles() {
        assert_eq!(
            error_codes("person sub entity, plays employment:boss; employment sub relation, relates employee;"),
            vec![ErrorCode::E204]
        );
        assert_eq!(
            error_codes("employment sub relation, relates worker as employee;"),
            vec![ErrorCode::E204]
        );
    }

    #[test]
    fn test_role_override_through_supertype() {
        let schema = resolve(
            "employment sub relation, relates employee;
             contract sub employment, relates contractor as employee;",
        )
        .unwrap();

        assert!(schema.find_role(schema.find_type("contract").unwrap(), "contractor").is_some());
    }

    #[test]
    fn test_builtin_misuse() {
        assert_eq!(error_codes("entity sub thing;"), vec![ErrorCode::E205]);
        assert_eq!(
            error_codes("person sub entity, owns attribute;"),
            vec![ErrorCode::E205]
        );
    }

    #[test]
    fn test_reports_all_problems() {
        let codes = error_codes(
            "person sub entity, owns nickname, plays friendship:pal;
             friendship sub relation, relates friend;
             company sub organisation;",
        );

        assert_eq!(
            codes,
            vec![ErrorCode::E200, ErrorCode::E200, ErrorCode::E204]
        );
    }
}
