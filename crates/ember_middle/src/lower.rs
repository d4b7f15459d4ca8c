use std::collections::HashMap;

use ember_frontend::ast::*;
use ember_session::diagnostics::prelude::*;
use ember_session::options::CompileOptions;

use crate::error::SemanticError;

pub struct LowerOutput {
    pub unit: CompilationUnit,
    /// Recorded errors, capped at [`CompileOptions::max_errors`].
    pub errors: Vec<SemanticError>,
    /// Counts every error, including those past the cap.
    pub total_errors: usize,
}

/// One walk over the merged unit: substitutes macro constants, fills default
/// arguments, and checks names, arities and scalar types. The unit is
/// annotated in place and handed back for code generation.
pub fn lower(unit: CompilationUnit, options: &CompileOptions) -> LowerOutput {
    Lowerer::new(options).run(unit)
}

#[derive(Clone)]
struct FuncSig {
    name_span: SourceSpan,
    has_self: bool,
    params: Vec<ParamSig>,
    ret_ty: Type,
}

#[derive(Clone)]
struct ParamSig {
    ty: Type,
    ty_span: SourceSpan,
    /// Validated and macro-substituted; filling a call site clones this.
    default: Option<Expr>,
}

struct StructInfo {
    fields: HashMap<String, Type>,
}

struct EnumInfo {
    variants: Vec<String>,
}

/// `(expected type, what made us expect it)`, threaded down so literals pick
/// up their width from context.
type Expected<'t> = Option<(&'t Type, Option<SourceSpan>)>;

struct Lowerer<'a> {
    options: &'a CompileOptions,

    consts: HashMap<String, (Literal, SourceSpan)>,
    funcs: HashMap<String, FuncSig>,
    structs: HashMap<String, StructInfo>,
    enums: HashMap<String, EnumInfo>,
    methods: HashMap<String, HashMap<String, FuncSig>>,

    errors: Vec<SemanticError>,
    total_errors: usize,

    // per-function state
    source_id: SourceId,
    scopes: Vec<Vec<(String, Option<Type>)>>,
    loop_depth: usize,
    ret_ty: Type,
    ret_span: Option<SourceSpan>,
}

impl<'a> Lowerer<'a> {
    fn new(options: &'a CompileOptions) -> Self {
        Self {
            options,

            consts: HashMap::new(),
            funcs: HashMap::new(),
            structs: HashMap::new(),
            enums: HashMap::new(),
            methods: HashMap::new(),

            errors: vec![],
            total_errors: 0,

            source_id: SourceId(0),
            scopes: vec![],
            loop_depth: 0,
            ret_ty: Type::Unit,
            ret_span: None,
        }
    }

    fn run(mut self, mut unit: CompilationUnit) -> LowerOutput {
        self.collect(&unit);

        for unit_item in &mut unit.items {
            self.source_id = unit_item.source_id;

            match &mut unit_item.item {
                Item::Func(func) => self.check_func(func, None),
                Item::Impl(impl_block) => {
                    let target = impl_block.target.name.clone();
                    for func in &mut impl_block.funcs {
                        self.check_func(func, Some(&target));
                    }
                }
                Item::MacroConst(_) | Item::Struct(_) | Item::Enum(_) | Item::ParseError => {}
            }
        }

        LowerOutput {
            unit,
            errors: self.errors,
            total_errors: self.total_errors,
        }
    }

    fn report(&mut self, error: SemanticError) {
        self.total_errors += 1;
        if self.errors.len() < self.options.max_errors {
            self.errors.push(error);
        }
    }

    fn at(&self, span: Span) -> SourceSpan {
        SourceSpan::new(self.source_id, span)
    }

    // ------------------------------------------------------------------
    // declaration tables

    fn collect(&mut self, unit: &CompilationUnit) {
        // macro constants first: a default may reference a constant declared
        // later in the unit
        for unit_item in &unit.items {
            self.source_id = unit_item.source_id;

            if let Item::MacroConst(decl) = &unit_item.item {
                let at = self.at(decl.name.span);
                match self.consts.get(&decl.name.name) {
                    Some((_, first)) => {
                        let error = SemanticError::DuplicateConst {
                            name: decl.name.name.clone(),
                            first: *first,
                            second: at,
                        };
                        self.report(error);
                    }
                    None => {
                        self.consts
                            .insert(decl.name.name.clone(), (decl.value.clone(), at));
                    }
                }
            }
        }

        // cross-file duplicates are already resolution errors, so only
        // same-file collisions are reported here
        let mut globals: HashMap<String, SourceSpan> = HashMap::new();

        for unit_item in &unit.items {
            self.source_id = unit_item.source_id;

            match &unit_item.item {
                Item::Func(func) => {
                    self.declare_global(&mut globals, &func.name);
                    let sig = self.collect_sig(func);
                    self.funcs.insert(func.name.name.clone(), sig);
                }

                Item::Struct(decl) => {
                    self.declare_global(&mut globals, &decl.name);
                    let fields = decl
                        .fields
                        .iter()
                        .map(|f| (f.name.name.clone(), f.ty.clone()))
                        .collect();
                    self.structs
                        .insert(decl.name.name.clone(), StructInfo { fields });
                }

                Item::Enum(decl) => {
                    self.declare_global(&mut globals, &decl.name);
                    let variants = decl.variants.iter().map(|v| v.name.clone()).collect();
                    self.enums
                        .insert(decl.name.name.clone(), EnumInfo { variants });
                }

                Item::MacroConst(_) | Item::Impl(_) | Item::ParseError => {}
            }
        }

        // impls in a second sweep so the target tables exist
        for unit_item in &unit.items {
            self.source_id = unit_item.source_id;

            if let Item::Impl(impl_block) = &unit_item.item {
                let target = &impl_block.target;
                if !self.structs.contains_key(&target.name)
                    && !self.enums.contains_key(&target.name)
                {
                    let error = SemanticError::UnknownName {
                        name: target.name.clone(),
                        at: self.at(target.span),
                    };
                    self.report(error);
                    continue;
                }

                for func in &impl_block.funcs {
                    let sig = self.collect_sig(func);
                    let second = sig.name_span;
                    let first = self
                        .methods
                        .entry(target.name.clone())
                        .or_default()
                        .insert(func.name.name.clone(), sig);

                    if let Some(first) = first {
                        let error = SemanticError::DuplicateDefinition {
                            name: format!("{}.{}", target.name, func.name.name),
                            first: first.name_span,
                            second,
                        };
                        self.report(error);
                    }
                }
            }
        }
    }

    fn declare_global(&mut self, globals: &mut HashMap<String, SourceSpan>, name: &Ident) {
        let at = self.at(name.span);

        match globals.get(&name.name) {
            Some(first) if first.source_id == at.source_id => {
                let error = SemanticError::DuplicateDefinition {
                    name: name.name.clone(),
                    first: *first,
                    second: at,
                };
                self.report(error);
            }
            Some(_) => {}
            None => {
                globals.insert(name.name.clone(), at);
            }
        }
    }

    // defaults must be constant-foldable: a literal, or a macro constant
    // that substitutes to one
    fn collect_sig(&mut self, func: &FuncDecl) -> FuncSig {
        let mut params = vec![];

        for param in &func.params {
            let default = param.default.clone().and_then(|mut expr| {
                if let ExprKind::Var(name) = &expr.kind {
                    if let Some((literal, _)) = self.consts.get(name) {
                        expr.kind = literal_expr_kind(&literal.kind);
                    }
                }

                match &expr.kind {
                    ExprKind::Integer(_)
                    | ExprKind::BinInteger { .. }
                    | ExprKind::String(_)
                    | ExprKind::Bool(_) => {
                        expr.ty = Some(param.ty.clone());
                        Some(expr)
                    }
                    _ => {
                        let error = SemanticError::NonConstDefault {
                            name: param.name.name.clone(),
                            at: self.at(expr.span),
                        };
                        self.report(error);
                        None
                    }
                }
            });

            params.push(ParamSig {
                ty: param.ty.clone(),
                ty_span: self.at(param.ty_span),
                default,
            });
        }

        FuncSig {
            name_span: self.at(func.name.span),
            has_self: func.has_self,
            params,
            ret_ty: func.ret_ty.clone(),
        }
    }

    // ------------------------------------------------------------------
    // functions and statements

    fn check_func(&mut self, func: &mut FuncDecl, self_ty: Option<&str>) {
        let mut top_scope = vec![];
        if let Some(target) = self_ty {
            if func.has_self {
                top_scope.push((
                    "self".to_owned(),
                    Some(Type::Ref(Box::new(Type::Named(target.to_owned())))),
                ));
            }
        }
        for param in &func.params {
            top_scope.push((param.name.name.clone(), Some(param.ty.clone())));
        }

        self.scopes = vec![top_scope];
        self.loop_depth = 0;
        self.ret_ty = func.ret_ty.clone();
        self.ret_span = func.ret_ty_span.map(|span| self.at(span));

        self.check_block(&mut func.body);

        if func.ret_ty != Type::Unit
            && !matches!(func.body.stmts.last(), Some(stmt) if stmt_is_diverging(stmt))
        {
            let error = SemanticError::MissingReturn {
                name: func.name.name.clone(),
                ty: func.ret_ty.clone(),
                at: self.ret_span.unwrap_or_else(|| self.at(func.name.span)),
            };
            self.report(error);
        }
    }

    fn check_block(&mut self, block: &mut Block) {
        self.scopes.push(vec![]);
        for stmt in &mut block.stmts {
            self.check_stmt(stmt);
        }
        self.scopes.pop();
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Let {
                name,
                ty,
                ty_span,
                value,
            } => {
                let declared = ty.clone();
                let due_to = ty_span.map(|span| self.at(span));
                self.check_expr(value, declared.as_ref().map(|t| (t, due_to)));

                let bound = declared.or_else(|| value.ty.clone());
                self.declare_local(&name.name, bound);
            }

            Stmt::Assign { target, value } => {
                let var_ty = match self.lookup_local(&target.name) {
                    Some(ty) => ty,
                    None => {
                        let error = SemanticError::UnknownName {
                            name: target.name.clone(),
                            at: self.at(target.span),
                        };
                        self.report(error);
                        None
                    }
                };

                self.check_expr(value, var_ty.as_ref().map(|t| (t, None)));
            }

            Stmt::IndexAssign {
                target,
                index,
                value,
            } => {
                match self.lookup_local(&target.name) {
                    None => {
                        let error = SemanticError::UnknownName {
                            name: target.name.clone(),
                            at: self.at(target.span),
                        };
                        self.report(error);
                    }
                    Some(Some(ty)) if !ty.is_integer() => {
                        let error = SemanticError::BitIndexTarget {
                            name: target.name.clone(),
                            ty,
                            at: self.at(target.span),
                        };
                        self.report(error);
                    }
                    Some(_) => {}
                }

                self.check_expr(index, None);
                self.check_expr(value, None);
            }

            Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                self.check_expr(cond, Some((&Type::Bool, None)));
                self.check_block(then_block);
                if let Some(else_block) = else_block {
                    self.check_block(else_block);
                }
            }

            Stmt::While { cond, body } => {
                self.check_expr(cond, Some((&Type::Bool, None)));
                self.loop_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
            }

            Stmt::Loop { body } => {
                self.loop_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
            }

            Stmt::ForRange {
                var,
                start,
                end,
                body,
                ..
            } => {
                // a literal bound takes its width from the other bound
                let (first, second) = literal_last(&mut *start, &mut *end);
                self.check_expr(first, None);
                let bound = first.ty.clone();
                self.check_expr(second, bound.as_ref().map(|t| (t, None)));

                let var_ty = start.ty.clone().or_else(|| end.ty.clone());

                self.loop_depth += 1;
                self.scopes.push(vec![(var.name.clone(), var_ty)]);
                for stmt in &mut body.stmts {
                    self.check_stmt(stmt);
                }
                self.scopes.pop();
                self.loop_depth -= 1;
            }

            Stmt::Return { value, span } => match value {
                Some(value) => {
                    let ret_ty = self.ret_ty.clone();
                    if ret_ty == Type::Unit {
                        self.check_expr(value, None);
                        if let Some(found) = value.ty.clone() {
                            let error = SemanticError::TypeMismatch {
                                expected: Type::Unit,
                                found,
                                at: self.at(value.span),
                                expected_due_to: None,
                            };
                            self.report(error);
                        }
                    } else {
                        let due_to = self.ret_span;
                        self.check_expr(value, Some((&ret_ty, due_to)));
                    }
                }
                None => {
                    if self.ret_ty != Type::Unit {
                        let error = SemanticError::TypeMismatch {
                            expected: self.ret_ty.clone(),
                            found: Type::Unit,
                            at: self.at(*span),
                            expected_due_to: self.ret_span,
                        };
                        self.report(error);
                    }
                }
            },

            Stmt::Assert { kind, .. } => match kind {
                AssertKind::Truthy(expr) => {
                    self.check_expr(expr, Some((&Type::Bool, None)));
                }
                AssertKind::Equal(lhs, rhs) => {
                    let (first, second) = literal_last(lhs, rhs);
                    self.check_expr(first, None);
                    let operand = first.ty.clone();
                    self.check_expr(second, operand.as_ref().map(|t| (t, None)));
                }
            },

            Stmt::Panic { payload, .. } => {
                self.check_expr(payload, None);
            }

            Stmt::Interrupt { number, span } => {
                if *number > 255 {
                    let error = SemanticError::InterruptOutOfRange {
                        number: *number,
                        at: self.at(*span),
                    };
                    self.report(error);
                }
            }

            Stmt::Break(span) => {
                if self.loop_depth == 0 {
                    let at = self.at(*span);
                    self.report(SemanticError::OutsideLoop {
                        keyword: "break",
                        at,
                    });
                }
            }

            Stmt::Continue(span) => {
                if self.loop_depth == 0 {
                    let at = self.at(*span);
                    self.report(SemanticError::OutsideLoop {
                        keyword: "continue",
                        at,
                    });
                }
            }

            Stmt::Expr(expr) => {
                self.check_expr(expr, None);
            }

            Stmt::ParseError => {}
        }
    }

    fn declare_local(&mut self, name: &str, ty: Option<Type>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push((name.to_owned(), ty));
        }
    }

    /// `None`: not in scope. `Some(None)`: in scope with unknown type.
    fn lookup_local(&self, name: &str) -> Option<Option<Type>> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(n, _)| n == name)
            .map(|(_, ty)| ty.clone())
    }

    // ------------------------------------------------------------------
    // expressions

    fn check_expr(&mut self, expr: &mut Expr, expected: Expected) {
        self.rewrite_expr(expr);

        let span = expr.span;

        let ty = if matches!(expr.kind, ExprKind::Call { .. }) {
            self.check_call(expr, span)
        } else {
            self.check_expr_kind(expr, expected)
        };
        expr.ty = ty;

        if let (Some((exp, due_to)), Some(found)) = (expected, expr.ty.as_ref()) {
            if found != exp {
                let error = SemanticError::TypeMismatch {
                    expected: exp.clone(),
                    found: found.clone(),
                    at: self.at(span),
                    expected_due_to: due_to,
                };
                self.report(error);
            }
        }
    }

    /// Macro-constant substitution and `Enum.Variant` folding both replace
    /// the node, so they run before the main check.
    fn rewrite_expr(&mut self, expr: &mut Expr) {
        match &expr.kind {
            ExprKind::Var(name) if self.lookup_local(name).is_none() => {
                if let Some((literal, _)) = self.consts.get(name) {
                    expr.kind = literal_expr_kind(&literal.kind);
                }
            }

            ExprKind::FieldAccess { target, field } => {
                let ExprKind::Var(name) = &target.kind else {
                    return;
                };
                if self.lookup_local(name).is_some() || !self.enums.contains_key(name) {
                    return;
                }

                let enum_name = name.clone();
                let variant = field.name.clone();
                let field_span = field.span;

                if !self.enums[&enum_name].variants.iter().any(|v| v == &variant) {
                    let error = SemanticError::UnknownVariant {
                        ty: enum_name.clone(),
                        variant: variant.clone(),
                        at: self.at(field_span),
                    };
                    self.report(error);
                }

                expr.kind = ExprKind::EnumVariant { enum_name, variant };
            }

            _ => {}
        }
    }

    fn check_expr_kind(&mut self, expr: &mut Expr, expected: Expected) -> Option<Type> {
        let span = expr.span;

        match &mut expr.kind {
            kind @ (ExprKind::Integer(_)
            | ExprKind::BinInteger { .. }
            | ExprKind::String(_)
            | ExprKind::Bool(_)) => {
                let kind = kind.clone();
                self.check_literal(&kind, span, expected)
            }

            ExprKind::Var(name) => match self.lookup_local(name) {
                Some(ty) => ty,
                None => {
                    let error = SemanticError::UnknownName {
                        name: name.clone(),
                        at: self.at(span),
                    };
                    self.report(error);
                    None
                }
            },

            ExprKind::UnOp { op, expr: inner } => match op {
                UnOp::Negate => {
                    let inner_expected = expected.filter(|(ty, _)| ty.is_integer());
                    self.check_expr(inner, inner_expected);
                    inner.ty.clone()
                }
                UnOp::Not => {
                    self.check_expr(inner, Some((&Type::Bool, None)));
                    Some(Type::Bool)
                }
            },

            ExprKind::BinOp { op, lhs, rhs } => {
                if op.is_boolean() {
                    match op {
                        BinOp::And | BinOp::Or => {
                            self.check_expr(lhs, Some((&Type::Bool, None)));
                            self.check_expr(rhs, Some((&Type::Bool, None)));
                        }
                        _ => {
                            let (first, second) = literal_last(lhs, rhs);
                            self.check_expr(first, None);
                            let operand = first.ty.clone();
                            self.check_expr(second, operand.as_ref().map(|t| (t, None)));
                        }
                    }
                    Some(Type::Bool)
                } else if matches!(op, BinOp::Shl | BinOp::Shr) {
                    let operand_expected = expected.filter(|(ty, _)| ty.is_integer());
                    self.check_expr(lhs, operand_expected);
                    // shift amounts may have any integer width
                    self.check_expr(rhs, None);

                    operand_expected
                        .map(|(ty, _)| ty.clone())
                        .or_else(|| lhs.ty.clone())
                } else {
                    let operand_expected = expected.filter(|(ty, _)| ty.is_integer());

                    if operand_expected.is_some() {
                        self.check_expr(lhs, operand_expected);
                        self.check_expr(rhs, operand_expected);
                    } else {
                        let (first, second) = literal_last(lhs, rhs);
                        self.check_expr(first, None);
                        let operand = first.ty.clone();
                        self.check_expr(second, operand.as_ref().map(|t| (t, None)));
                    }

                    operand_expected
                        .map(|(ty, _)| ty.clone())
                        .or_else(|| lhs.ty.clone())
                        .or_else(|| rhs.ty.clone())
                }
            }

            ExprKind::Range { .. } => {
                let error = SemanticError::RangeOutsideFor { at: self.at(span) };
                self.report(error);
                None
            }

            // handled in `check_expr`
            ExprKind::Call { .. } => None,

            ExprKind::Index { target, index } => {
                self.check_expr(target, None);
                self.check_expr(index, None);

                match target.ty.clone() {
                    Some(ty) if ty.is_integer() => Some(ty),
                    Some(ty) => {
                        let error = SemanticError::NotIndexable {
                            ty,
                            at: self.at(target.span),
                        };
                        self.report(error);
                        None
                    }
                    None => None,
                }
            }

            ExprKind::FieldAccess { target, field } => {
                let field = field.clone();
                self.check_field_access(target, &field)
            }

            ExprKind::EnumVariant { enum_name, .. } => Some(Type::Named(enum_name.clone())),

            ExprKind::Ref(inner) => {
                self.check_expr(inner, None);
                inner.ty.clone().map(|ty| Type::Ref(Box::new(ty)))
            }

            ExprKind::ParseError => None,
        }
    }

    fn check_field_access(&mut self, target: &mut Expr, field: &Ident) -> Option<Type> {
        self.check_expr(target, None);

        let ty = target.ty.as_ref().map(strip_ref)?;
        let Type::Named(name) = ty else {
            let ty = ty.clone();
            let error = SemanticError::UnknownField {
                ty: ty.to_string(),
                field: field.name.clone(),
                at: self.at(field.span),
            };
            self.report(error);
            return None;
        };
        let name = name.clone();

        match self
            .structs
            .get(&name)
            .and_then(|s| s.fields.get(&field.name))
        {
            Some(field_ty) => Some(field_ty.clone()),
            None => {
                let error = SemanticError::UnknownField {
                    ty: name,
                    field: field.name.clone(),
                    at: self.at(field.span),
                };
                self.report(error);
                None
            }
        }
    }

    fn check_call(&mut self, expr: &mut Expr, span: Span) -> Option<Type> {
        let ExprKind::Call { callee, args } = &mut expr.kind else {
            return None;
        };

        match &mut callee.kind {
            ExprKind::Var(name) => {
                let name = name.clone();
                let Some(sig) = self.funcs.get(&name).cloned() else {
                    let callee_span = callee.span;
                    let error = SemanticError::UnknownFunction {
                        name,
                        at: self.at(callee_span),
                    };
                    self.report(error);
                    for arg in args {
                        self.check_expr(arg, None);
                    }
                    return None;
                };

                self.check_call_args(&name, &sig, args, span)
            }

            ExprKind::FieldAccess { target, field } => {
                // `Type.func(...)` calls a method without a receiver
                if let ExprKind::Var(type_name) = &target.kind {
                    if self.lookup_local(type_name).is_none()
                        && self.methods.contains_key(type_name)
                    {
                        let type_name = type_name.clone();
                        let method = field.name.clone();
                        let field_span = field.span;

                        let Some(sig) = self.methods[&type_name].get(&method).cloned() else {
                            let error = SemanticError::UnknownMethod {
                                ty: type_name,
                                method,
                                at: self.at(field_span),
                            };
                            self.report(error);
                            return None;
                        };

                        if sig.has_self {
                            let error = SemanticError::UnknownMethod {
                                ty: type_name.clone(),
                                method: method.clone(),
                                at: self.at(field_span),
                            };
                            self.report(error);
                        }

                        let callee_name = format!("{type_name}.{method}");
                        return self.check_call_args(&callee_name, &sig, args, span);
                    }
                }

                self.check_expr(target, None);

                let receiver_ty = target.ty.clone();
                let Some(Type::Named(type_name)) = receiver_ty.as_ref().map(strip_ref) else {
                    if let Some(ty) = receiver_ty {
                        let error = SemanticError::UnknownMethod {
                            ty: ty.to_string(),
                            method: field.name.clone(),
                            at: self.at(field.span),
                        };
                        self.report(error);
                    }
                    for arg in args {
                        self.check_expr(arg, None);
                    }
                    return None;
                };
                let type_name = type_name.clone();

                let sig = self
                    .methods
                    .get(&type_name)
                    .and_then(|table| table.get(&field.name))
                    .filter(|sig| sig.has_self)
                    .cloned();

                let Some(sig) = sig else {
                    let field_span = field.span;
                    let error = SemanticError::UnknownMethod {
                        ty: type_name,
                        method: field.name.clone(),
                        at: self.at(field_span),
                    };
                    self.report(error);
                    for arg in args {
                        self.check_expr(arg, None);
                    }
                    return None;
                };

                let callee_name = format!("{type_name}.{}", field.name);
                self.check_call_args(&callee_name, &sig, args, span)
            }

            ExprKind::ParseError => None,

            _ => {
                let callee_span = callee.span;
                let error = SemanticError::NotCallable {
                    at: self.at(callee_span),
                };
                self.report(error);
                None
            }
        }
    }

    /// Checks arity against the defaulted suffix, type-checks each argument,
    /// then appends clones of the missing defaults so the backend sees a
    /// fully explicit call.
    fn check_call_args(
        &mut self,
        callee: &str,
        sig: &FuncSig,
        args: &mut Vec<Expr>,
        span: Span,
    ) -> Option<Type> {
        let required = sig
            .params
            .iter()
            .take_while(|p| p.default.is_none())
            .count();
        let max = sig.params.len();

        if args.len() < required || args.len() > max {
            let expected = if required == max {
                required.to_string()
            } else {
                format!("{required} to {max}")
            };

            let error = SemanticError::ArityMismatch {
                callee: callee.to_owned(),
                expected,
                found: args.len(),
                at: self.at(span),
            };
            self.report(error);

            for arg in args {
                self.check_expr(arg, None);
            }
            return Some(sig.ret_ty.clone());
        }

        for (arg, param) in args.iter_mut().zip(&sig.params) {
            self.check_expr(arg, Some((&param.ty, Some(param.ty_span))));
        }

        // validated defaults always exist past `required`
        for param in &sig.params[args.len()..] {
            if let Some(default) = &param.default {
                args.push(default.clone());
            }
        }

        Some(sig.ret_ty.clone())
    }

    fn check_literal(&mut self, kind: &ExprKind, span: Span, expected: Expected) -> Option<Type> {
        match kind {
            ExprKind::Integer(value) => match expected {
                Some((ty, _)) if ty.is_integer() => {
                    if !integer_fits(*value, ty) {
                        let error = SemanticError::LiteralOutOfRange {
                            value: value.to_string(),
                            ty: ty.clone(),
                            at: self.at(span),
                        };
                        self.report(error);
                    }
                    Some(ty.clone())
                }
                _ => Some(Type::I64),
            },

            ExprKind::BinInteger { value, width } => match expected {
                Some((ty, _)) if ty.is_integer() => {
                    if ty.integer_bits().is_some_and(|bits| *width > bits) {
                        let error = SemanticError::LiteralOutOfRange {
                            value: format!("0b{value:0w$b}", w = *width as usize),
                            ty: ty.clone(),
                            at: self.at(span),
                        };
                        self.report(error);
                    }
                    Some(ty.clone())
                }
                _ => Some(match width {
                    0..=8 => Type::U8,
                    9..=16 => Type::U16,
                    17..=32 => Type::U32,
                    _ => Type::U64,
                }),
            },

            ExprKind::String(_) => Some(Type::Str),
            ExprKind::Bool(_) => Some(Type::Bool),

            _ => None,
        }
    }
}

fn literal_expr_kind(kind: &LiteralKind) -> ExprKind {
    match kind {
        LiteralKind::Integer(n) => ExprKind::Integer(*n),
        LiteralKind::BinInteger { value, width } => ExprKind::BinInteger {
            value: *value,
            width: *width,
        },
        LiteralKind::String(s) => ExprKind::String(s.clone()),
        LiteralKind::Bool(b) => ExprKind::Bool(*b),
    }
}

fn is_literal(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Integer(_) | ExprKind::BinInteger { .. }
    )
}

/// Orders an operand pair so that an integer literal is checked against the
/// other operand's type instead of defaulting to `i64`.
fn literal_last<'e>(lhs: &'e mut Expr, rhs: &'e mut Expr) -> (&'e mut Expr, &'e mut Expr) {
    if is_literal(lhs) && !is_literal(rhs) {
        (rhs, lhs)
    } else {
        (lhs, rhs)
    }
}

fn strip_ref(ty: &Type) -> &Type {
    match ty {
        Type::Ref(inner) => inner,
        other => other,
    }
}

fn integer_fits(value: u64, ty: &Type) -> bool {
    let Some(bits) = ty.integer_bits() else {
        return false;
    };

    let max: u128 = if ty.is_signed() {
        (1u128 << (bits - 1)) - 1
    } else {
        (1u128 << bits) - 1
    };

    u128::from(value) <= max
}

fn stmt_is_diverging(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return { .. } | Stmt::Panic { .. } => true,

        // a `loop` only terminates through `break` or `return`, so falling
        // off the end of the function through one is impossible
        Stmt::Loop { .. } => true,

        Stmt::If {
            then_block,
            else_block: Some(else_block),
            ..
        } => {
            matches!(then_block.stmts.last(), Some(s) if stmt_is_diverging(s))
                && matches!(else_block.stmts.last(), Some(s) if stmt_is_diverging(s))
        }

        _ => false,
    }
}
