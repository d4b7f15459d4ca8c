use std::collections::HashMap;
use std::fmt::Write;

use ember_frontend::ast::*;
use ember_session::diagnostics::prelude::*;
use ember_session::options::CompileOptions;
use ember_session::sourcemap::SourceMap;

use crate::BackendResult;

/// Emits one self-contained C translation unit from the lowered unit.
///
/// Declarations keep program order and every table is walked in insertion
/// order, so identical input yields byte-identical output.
pub fn generate(
    unit: &CompilationUnit,
    sources: &SourceMap,
    options: &CompileOptions,
) -> BackendResult<String> {
    let mut codegen = Codegen {
        unit,
        sources,
        options,
        out: String::new(),
    };

    codegen.run()?;
    Ok(codegen.out)
}

struct Codegen<'a> {
    unit: &'a CompilationUnit,
    sources: &'a SourceMap,
    options: &'a CompileOptions,
    out: String,
}

impl Codegen<'_> {
    fn run(&mut self) -> BackendResult<()> {
        self.gen_prelude()?;
        self.gen_typedefs()?;
        self.gen_prototypes()?;
        self.gen_runtime()?;
        self.gen_definitions()?;
        Ok(())
    }

    fn gen_prelude(&mut self) -> BackendResult<()> {
        writeln!(self.out, "#include <stdint.h>")?;
        writeln!(self.out, "#include <stdbool.h>")?;
        writeln!(self.out, "#include <stddef.h>")?;

        // stdio is only referenced when a panic sink needs it
        if self.options.logging || self.options.printing {
            writeln!(self.out, "#include <stdio.h>")?;
        }

        // exit() backs the deterministic halt of the panic routine
        writeln!(self.out, "#include <stdlib.h>")?;
        writeln!(self.out)?;
        Ok(())
    }

    fn gen_typedefs(&mut self) -> BackendResult<()> {
        for unit_item in &self.unit.items {
            match &unit_item.item {
                Item::Struct(decl) => {
                    writeln!(self.out, "typedef struct {{")?;
                    for field in &decl.fields {
                        writeln!(self.out, "    {} {};", c_type(&field.ty), field.name.name)?;
                    }
                    writeln!(self.out, "}} {};", decl.name.name)?;
                    writeln!(self.out)?;
                }

                Item::Enum(decl) => {
                    let variants = decl
                        .variants
                        .iter()
                        .map(|v| format!("{}_{}", decl.name.name, v.name))
                        .collect::<Vec<_>>()
                        .join(", ");
                    writeln!(self.out, "typedef enum {{ {variants} }} {};", decl.name.name)?;
                    writeln!(self.out)?;
                }

                _ => {}
            }
        }

        Ok(())
    }

    fn gen_prototypes(&mut self) -> BackendResult<()> {
        let mut emitted = false;

        for unit_item in &self.unit.items {
            match &unit_item.item {
                Item::Func(func) => {
                    writeln!(self.out, "{};", func_signature(func, None))?;
                    emitted = true;
                }
                Item::Impl(impl_block) => {
                    for func in &impl_block.funcs {
                        writeln!(
                            self.out,
                            "{};",
                            func_signature(func, Some(&impl_block.target.name))
                        )?;
                        emitted = true;
                    }
                }
                _ => {}
            }
        }

        if emitted {
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// The embedded runtime: the interrupt stub, the optional heap-release
    /// hook, and the panic routine. The panic sequence is release, log,
    /// print, exit; a disabled capability emits nothing for its step.
    fn gen_runtime(&mut self) -> BackendResult<()> {
        writeln!(self.out, "void ember_interrupt(uint8_t number) {{")?;
        writeln!(self.out, "    (void)number;")?;
        writeln!(self.out, "}}")?;
        writeln!(self.out)?;

        if self.options.heap_allocator {
            writeln!(self.out, "void ember_release_heap(void) {{")?;
            writeln!(self.out, "}}")?;
            writeln!(self.out)?;
        }

        writeln!(self.out, "void ember_panic_str(const char *payload) {{")?;
        if self.options.heap_allocator {
            writeln!(self.out, "    ember_release_heap();")?;
        }
        if self.options.logging {
            writeln!(self.out, "    fprintf(stderr, \"panic: %s\\n\", payload);")?;
        }
        if self.options.printing {
            writeln!(self.out, "    printf(\"panic: %s\\n\", payload);")?;
        }
        writeln!(self.out, "    exit(1);")?;
        writeln!(self.out, "}}")?;
        writeln!(self.out)?;

        writeln!(self.out, "void ember_panic_int(int64_t payload) {{")?;
        if self.options.heap_allocator {
            writeln!(self.out, "    ember_release_heap();")?;
        }
        if self.options.logging {
            writeln!(
                self.out,
                "    fprintf(stderr, \"panic: %lld\\n\", (long long)payload);"
            )?;
        }
        if self.options.printing {
            writeln!(self.out, "    printf(\"panic: %lld\\n\", (long long)payload);")?;
        }
        writeln!(self.out, "    exit((int)payload);")?;
        writeln!(self.out, "}}")?;
        writeln!(self.out)?;

        Ok(())
    }

    fn gen_definitions(&mut self) -> BackendResult<()> {
        for unit_item in &self.unit.items {
            match &unit_item.item {
                Item::Func(func) => {
                    self.gen_func(func, None, unit_item.source_id)?;
                }
                Item::Impl(impl_block) => {
                    for func in &impl_block.funcs {
                        self.gen_func(func, Some(&impl_block.target.name), unit_item.source_id)?;
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn gen_func(
        &mut self,
        func: &FuncDecl,
        method_of: Option<&str>,
        source_id: SourceId,
    ) -> BackendResult<()> {
        writeln!(self.out, "{} {{", func_signature(func, method_of))?;

        let mut locals = HashMap::new();
        if func.has_self {
            if let Some(target) = method_of {
                locals.insert(
                    "self".to_owned(),
                    Type::Ref(Box::new(Type::Named(target.to_owned()))),
                );
            }
        }
        for param in &func.params {
            locals.insert(param.name.name.clone(), param.ty.clone());
        }

        let mut func_codegen = FuncCodegen {
            out: &mut self.out,
            sources: self.sources,
            source_id,
            locals,
            indent: 1,
        };

        for stmt in &func.body.stmts {
            func_codegen.gen_stmt(stmt)?;
        }

        writeln!(self.out, "}}")?;
        writeln!(self.out)?;
        Ok(())
    }
}

struct FuncCodegen<'a> {
    out: &'a mut String,
    sources: &'a SourceMap,
    source_id: SourceId,
    locals: HashMap<String, Type>,
    indent: usize,
}

impl FuncCodegen<'_> {
    fn line(&mut self, line: &str) -> BackendResult<()> {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(line);
        self.out.push('\n');
        Ok(())
    }

    fn gen_block(&mut self, block: &Block) -> BackendResult<()> {
        self.indent += 1;
        for stmt in &block.stmts {
            self.gen_stmt(stmt)?;
        }
        self.indent -= 1;
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &Stmt) -> BackendResult<()> {
        match stmt {
            Stmt::Let {
                name, ty, value, ..
            } => {
                let ty = ty
                    .clone()
                    .or_else(|| value.ty.clone())
                    .unwrap_or(Type::I64);
                let value = self.gen_expr(value);
                self.line(&format!("{} {} = {};", c_type(&ty), name.name, value))?;
                self.locals.insert(name.name.clone(), ty);
            }

            Stmt::Assign { target, value } => {
                let value = self.gen_expr(value);
                self.line(&format!("{} = {};", target.name, value))?;
            }

            // clear the bit, then OR in the low bit of the value
            Stmt::IndexAssign {
                target,
                index,
                value,
            } => {
                let ty = self
                    .locals
                    .get(&target.name)
                    .cloned()
                    .unwrap_or(Type::U64);
                let ty = c_type(&ty);
                let index = self.gen_expr(index);
                let value = self.gen_expr(value);
                let name = &target.name;

                self.line(&format!(
                    "{name} = ({ty})(({name} & ~(({ty})1 << ({index}))) | ((({ty})({value}) & 1) << ({index})));"
                ))?;
            }

            Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                let cond = self.gen_expr(cond);
                self.line(&format!("if ({cond}) {{"))?;
                self.gen_block(then_block)?;

                match else_block {
                    Some(else_block) => {
                        self.line("} else {")?;
                        self.gen_block(else_block)?;
                        self.line("}")?;
                    }
                    None => {
                        self.line("}")?;
                    }
                }
            }

            Stmt::While { cond, body } => {
                let cond = self.gen_expr(cond);
                self.line(&format!("while ({cond}) {{"))?;
                self.gen_block(body)?;
                self.line("}")?;
            }

            Stmt::Loop { body } => {
                self.line("for (;;) {")?;
                self.gen_block(body)?;
                self.line("}")?;
            }

            Stmt::ForRange {
                var,
                start,
                end,
                inclusive,
                body,
            } => {
                let ty = start
                    .ty
                    .clone()
                    .or_else(|| end.ty.clone())
                    .unwrap_or(Type::I64);
                let cmp = if *inclusive { "<=" } else { "<" };
                let start_code = self.gen_expr(start);
                let end_code = self.gen_expr(end);
                let name = &var.name;

                self.line(&format!(
                    "for ({} {name} = {start_code}; {name} {cmp} {end_code}; {name}++) {{",
                    c_type(&ty)
                ))?;
                self.locals.insert(var.name.clone(), ty);
                self.gen_block(body)?;
                self.line("}")?;
            }

            Stmt::Return { value, .. } => match value {
                Some(value) => {
                    let value = self.gen_expr(value);
                    self.line(&format!("return {value};"))?;
                }
                None => self.line("return;")?,
            },

            Stmt::Assert { kind, span } => {
                let cond = match kind {
                    AssertKind::Truthy(expr) => self.gen_expr(expr),
                    AssertKind::Equal(lhs, rhs) => {
                        format!("({}) == ({})", self.gen_expr(lhs), self.gen_expr(rhs))
                    }
                };

                let location = self.location(*span);
                self.line(&format!("if (!({cond})) {{"))?;
                self.indent += 1;
                self.line(&format!(
                    "ember_panic_str(\"assertion failed at {location}\");"
                ))?;
                self.indent -= 1;
                self.line("}")?;
            }

            Stmt::Panic { payload, .. } => {
                let code = self.gen_expr(payload);
                let is_string = matches!(payload.ty, Some(Type::Str))
                    || matches!(payload.kind, ExprKind::String(_));

                if is_string {
                    self.line(&format!("ember_panic_str({code});"))?;
                } else {
                    self.line(&format!("ember_panic_int((int64_t)({code}));"))?;
                }
            }

            Stmt::Interrupt { number, .. } => {
                self.line(&format!("ember_interrupt({number});"))?;
            }

            Stmt::Break(_) => self.line("break;")?,
            Stmt::Continue(_) => self.line("continue;")?,

            Stmt::Expr(expr) => {
                let code = self.gen_expr(expr);
                self.line(&format!("{code};"))?;
            }

            // never reached: codegen is skipped when any pass errored
            Stmt::ParseError => {}
        }

        Ok(())
    }

    fn gen_expr(&self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Integer(n) => {
                if *n > i32::MAX as u64 {
                    format!("{n}ULL")
                } else {
                    n.to_string()
                }
            }
            ExprKind::BinInteger { value, .. } => value.to_string(),
            ExprKind::String(s) => c_string(s),
            ExprKind::Bool(b) => b.to_string(),

            ExprKind::Var(name) => name.clone(),

            ExprKind::UnOp { op, expr } => {
                let inner = self.gen_expr(expr);
                match op {
                    UnOp::Negate => format!("(-{inner})"),
                    UnOp::Not => format!("(!{inner})"),
                }
            }

            ExprKind::BinOp { op, lhs, rhs } => {
                format!(
                    "({} {} {})",
                    self.gen_expr(lhs),
                    c_bin_op(*op),
                    self.gen_expr(rhs)
                )
            }

            ExprKind::Call { callee, args } => self.gen_call(callee, args),

            // single-bit read
            ExprKind::Index { target, index } => {
                format!("(({} >> ({})) & 1)", self.gen_expr(target), self.gen_expr(index))
            }

            ExprKind::FieldAccess { target, field } => {
                let sep = if matches!(target.ty, Some(Type::Ref(_))) {
                    "->"
                } else {
                    "."
                };
                format!("{}{sep}{}", self.gen_expr(target), field.name)
            }

            ExprKind::EnumVariant { enum_name, variant } => format!("{enum_name}_{variant}"),

            ExprKind::Ref(inner) => format!("(&{})", self.gen_expr(inner)),

            // both rejected before codegen runs
            ExprKind::Range { .. } | ExprKind::ParseError => String::new(),
        }
    }

    fn gen_call(&self, callee: &Expr, args: &[Expr]) -> String {
        let args_code: Vec<String> = args.iter().map(|arg| self.gen_expr(arg)).collect();

        match &callee.kind {
            ExprKind::Var(name) => format!("{name}({})", args_code.join(", ")),

            ExprKind::FieldAccess { target, field } => match &target.ty {
                Some(receiver_ty) => {
                    let type_name = match strip_ref(receiver_ty) {
                        Type::Named(name) => name.clone(),
                        other => other.to_string(),
                    };

                    // methods take an explicit pointer receiver; a receiver
                    // that is already a reference is passed through
                    let receiver = self.gen_expr(target);
                    let receiver = if matches!(receiver_ty, Type::Ref(_)) {
                        receiver
                    } else {
                        format!("&{receiver}")
                    };

                    let mut all = vec![receiver];
                    all.extend(args_code);
                    format!("{type_name}_{}({})", field.name, all.join(", "))
                }

                // `Type.func(...)` has no receiver expression
                None => match &target.kind {
                    ExprKind::Var(type_name) => {
                        format!("{type_name}_{}({})", field.name, args_code.join(", "))
                    }
                    _ => String::new(),
                },
            },

            _ => String::new(),
        }
    }

    fn location(&self, span: Span) -> String {
        match self.sources.get(self.source_id) {
            Some(source) => {
                let name = &source.as_source().name;
                match source.line_col(span.start) {
                    Some((line, _)) => format!("{name}:{line}"),
                    None => name.clone(),
                }
            }
            None => "<unknown>".to_owned(),
        }
    }
}

fn func_signature(func: &FuncDecl, method_of: Option<&str>) -> String {
    let mut sig = String::new();
    sig.push_str(&c_type(&func.ret_ty));
    sig.push(' ');

    if let Some(target) = method_of {
        sig.push_str(target);
        sig.push('_');
    }
    sig.push_str(&func.name.name);
    sig.push('(');

    let mut params = vec![];
    if func.has_self {
        if let Some(target) = method_of {
            params.push(format!("{target} *self"));
        }
    }
    for param in &func.params {
        params.push(format!("{} {}", c_type(&param.ty), param.name.name));
    }

    if params.is_empty() {
        sig.push_str("void");
    } else {
        sig.push_str(&params.join(", "));
    }

    sig.push(')');
    sig
}

fn c_type(ty: &Type) -> String {
    match ty {
        Type::U8 => "uint8_t".to_owned(),
        Type::U16 => "uint16_t".to_owned(),
        Type::U32 => "uint32_t".to_owned(),
        Type::U64 => "uint64_t".to_owned(),
        Type::I8 => "int8_t".to_owned(),
        Type::I16 => "int16_t".to_owned(),
        Type::I32 => "int32_t".to_owned(),
        Type::I64 => "int64_t".to_owned(),
        Type::Bool => "bool".to_owned(),
        Type::Str => "const char *".to_owned(),
        Type::Unit => "void".to_owned(),
        Type::Ref(inner) => format!("{} *", c_type(inner)),
        Type::Named(name) => name.clone(),
    }
}

fn c_bin_op(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::BitAnd => "&",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::Shl => "<<",
        BinOp::Shr => ">>",
        BinOp::Eq => "==",
        BinOp::NotEq => "!=",
        BinOp::Lt => "<",
        BinOp::Gt => ">",
        BinOp::LtEq => "<=",
        BinOp::GtEq => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
    }
}

fn c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn strip_ref(ty: &Type) -> &Type {
    match ty {
        Type::Ref(inner) => inner,
        other => other,
    }
}
