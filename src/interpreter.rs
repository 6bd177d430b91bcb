use std::collections::HashMap;
use std::rc::Rc;

use num_traits::ToPrimitive;

use crate::ast::{
    BinOp, CallArg, DeclKind, Expr, ImportNames, LogicOp, Program, Stmt, Target, UnaryOp,
    VersionOp, VersionReq,
};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::runtime::builtins::{builtin_types_module, default_builtins};
use crate::runtime::modules::{ModuleError, ModuleLoader};
use crate::runtime::version::Version;
use crate::runtime::{self, Scope, ScopeRef, Slot};
use crate::value::{
    new_object, FuncData, ObjectData, ParentRef, PropertyData, RuntimeError, SpecName, Value,
};

/// The tree-walking evaluator. Print output is captured in an internal
/// buffer so embedders and tests can inspect it.
pub struct Interpreter {
    pub(crate) env: ScopeRef,
    pub(crate) module_obj: Rc<ObjectData>,
    pub(crate) builtins: HashMap<String, Value>,
    pub(crate) output: String,
    pub(crate) loader: Option<Box<dyn ModuleLoader>>,
    pub(crate) modules: HashMap<String, Value>,
    pub(crate) version: Version,
    pub(crate) depth: usize,
    pub(crate) path: String,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let module_obj = new_object("module");
        let env = Scope::root(Some(ParentRef::Object(Rc::downgrade(&module_obj))));
        Self {
            env,
            module_obj,
            builtins: default_builtins(),
            output: String::new(),
            loader: None,
            modules: HashMap::new(),
            version: Version::parse(env!("CARGO_PKG_VERSION"))
                .unwrap_or_else(|| Version::new(&[0, 1, 0])),
            depth: 0,
            path: "<main>".to_string(),
        }
    }

    pub fn with_loader(mut self, loader: Box<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn set_program_path(&mut self, path: &str) {
        self.path = path.to_string();
    }

    pub fn define_builtin(&mut self, name: &str, value: Value) {
        self.builtins.insert(name.to_string(), value);
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn program_path(&self) -> &str {
        &self.path
    }

    pub fn run_source(&mut self, source: &str) -> Result<Value, RuntimeError> {
        let tokens = Lexer::new(source).tokenize()?;
        let program = Parser::new(tokens).parse_program()?;
        self.run(&program)
    }

    pub fn run(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        let mut last = Value::Null;
        for stmt in &program.stmts {
            last = self.exec_stmt(stmt)?;
        }
        Ok(last)
    }

    // region statements

    pub(crate) fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Value, RuntimeError> {
        self.exec_stmt_inner(stmt)
            .map_err(|e| e.with_span(stmt.start()))
    }

    pub(crate) fn exec_block_raw(&mut self, stmts: &[Stmt]) -> Result<Value, RuntimeError> {
        let mut last = Value::Null;
        for stmt in stmts {
            last = self.exec_stmt(stmt)?;
        }
        Ok(last)
    }

    pub(crate) fn exec_block_scoped(&mut self, stmts: &[Stmt]) -> Result<Value, RuntimeError> {
        let frame = Scope::child(&self.env, None);
        let saved = std::mem::replace(&mut self.env, frame);
        let result = self.exec_block_raw(stmts);
        self.env = saved;
        result
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt) -> Result<Value, RuntimeError> {
        match stmt {
            Stmt::Expr { expr, .. } => self.eval_expr(expr),
            Stmt::Decl {
                kind,
                target,
                value,
                start,
            } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                let name = self.resolve_target(target)?;
                self.declare_value(*kind, &name, value, *start)
            }
            Stmt::Block(stmts) => self.exec_block_scoped(stmts),
            Stmt::While { cond, body, start } => self.exec_while(cond, body, *start),
            Stmt::For {
                var,
                iterable,
                body,
                start,
            } => self.exec_for(var, iterable, body, *start),
            Stmt::Break { amount, start } => {
                let depth = self.signal_amount(amount.as_ref(), true, *start)?;
                if depth == 0 {
                    return Ok(Value::Null);
                }
                Err(RuntimeError::break_signal(depth).with_span(*start))
            }
            Stmt::Continue { amount, start } => {
                let depth = self.signal_amount(amount.as_ref(), false, *start)?;
                if depth == 0 {
                    return Ok(Value::Null);
                }
                Err(RuntimeError::continue_signal(depth, false).with_span(*start))
            }
            Stmt::Return { value, start } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                Err(RuntimeError::return_signal(value).with_span(*start))
            }
            Stmt::Raise { value, start } => {
                let value = self.eval_expr(value)?;
                let rendered = self.repr_value(&value, *start)?;
                Err(RuntimeError::raised(value, rendered).with_span(*start))
            }
            Stmt::Del { name, start } => {
                if runtime::remove_binding(&self.env, name) {
                    Ok(Value::Null)
                } else {
                    Err(
                        RuntimeError::name(format!("Name {:?} is not defined", name))
                            .with_span(*start),
                    )
                }
            }
            Stmt::Try {
                body, catch, els, ..
            } => self.exec_try(body, catch.as_ref(), els.as_deref()),
            Stmt::Switch {
                subject,
                cases,
                default,
                start,
            } => self.exec_switch(subject, cases, default.as_deref(), *start),
            Stmt::Edit {
                target,
                body,
                start,
            } => {
                let target_v = self.eval_expr(target)?;
                let Some(binding) = ParentRef::from_value(&target_v) else {
                    return Err(
                        RuntimeError::type_error("Only objects can be edited").with_span(*start)
                    );
                };
                let frame = Scope::child(&self.env, Some(binding));
                let saved = std::mem::replace(&mut self.env, frame);
                let result = self.exec_block_raw(body);
                self.env = saved;
                result?;
                Ok(target_v)
            }
            Stmt::Import {
                names,
                source,
                source_is_url,
                start,
            } => self.exec_import(names, source, *source_is_url, *start),
            Stmt::VersionCheck { req, start } => self.check_version(req, *start),
        }
    }

    fn exec_while(
        &mut self,
        cond: &Expr,
        body: &[Stmt],
        start: usize,
    ) -> Result<Value, RuntimeError> {
        let mut last = Value::Null;
        loop {
            let c = self.eval_expr(cond)?;
            if !self.bool_value(&c, start)? {
                break;
            }
            match self.exec_block_scoped(body) {
                Ok(v) => last = v,
                Err(e) => {
                    if let Some(depth) = e.break_depth {
                        if depth <= 1 {
                            break;
                        }
                        return Err(RuntimeError::break_signal(depth - 1).with_span(start));
                    }
                    if let Some(depth) = e.continue_depth {
                        if depth <= 1 {
                            continue;
                        }
                        return Err(
                            RuntimeError::continue_signal(depth - 1, true).with_span(start)
                        );
                    }
                    return Err(e);
                }
            }
        }
        Ok(last)
    }

    fn exec_for(
        &mut self,
        var: &str,
        iterable: &Expr,
        body: &[Stmt],
        start: usize,
    ) -> Result<Value, RuntimeError> {
        let source = self.eval_expr(iterable)?;
        let iter = self.invoke_spec(&source, SpecName::Iter, Vec::new(), start)?;
        let mut last = Value::Null;
        loop {
            let item = match self.invoke_spec(&iter, SpecName::Next, Vec::new(), start) {
                Ok(item) => item,
                Err(e) => {
                    if let Some(depth) = e.break_depth {
                        if depth <= 1 {
                            break;
                        }
                        return Err(RuntimeError::break_signal(depth - 1).with_span(start));
                    }
                    return Err(e);
                }
            };
            let frame = Scope::child(&self.env, None);
            frame.borrow_mut().vars.insert(var.to_string(), item);
            let saved = std::mem::replace(&mut self.env, frame);
            let result = self.exec_block_raw(body);
            self.env = saved;
            match result {
                Ok(v) => last = v,
                Err(e) => {
                    if let Some(depth) = e.break_depth {
                        if depth <= 1 {
                            break;
                        }
                        return Err(RuntimeError::break_signal(depth - 1).with_span(start));
                    }
                    if let Some(depth) = e.continue_depth {
                        if depth <= 1 {
                            continue;
                        }
                        return Err(
                            RuntimeError::continue_signal(depth - 1, true).with_span(start)
                        );
                    }
                    return Err(e);
                }
            }
        }
        Ok(last)
    }

    fn signal_amount(
        &mut self,
        amount: Option<&Expr>,
        is_break: bool,
        start: usize,
    ) -> Result<u32, RuntimeError> {
        let Some(expr) = amount else {
            return Ok(1);
        };
        let value = self.eval_expr(expr)?;
        let Value::Num(n) = value else {
            let rendered = self.repr_value(&value, start)?;
            return Err(RuntimeError::type_error(format!(
                "Expected a number for {} amount, got {} instead.",
                if is_break { "break" } else { "continue" },
                rendered
            ))
            .with_span(start));
        };
        if n.fract() != 0.0 {
            return Err(RuntimeError::type_error(format!(
                "Expected a whole number for {} amount",
                if is_break { "break" } else { "continue" }
            ))
            .with_span(start));
        }
        let depth = n.to_i64().unwrap_or(0);
        if depth < 0 {
            let msg = if is_break {
                "You can't breakout of a negative number of loops"
            } else {
                "You can't skip a negative number of loops"
            };
            return Err(RuntimeError::value(msg).with_span(start));
        }
        Ok(depth as u32)
    }

    fn exec_try(
        &mut self,
        body: &[Stmt],
        catch: Option<&(Option<String>, Vec<Stmt>)>,
        els: Option<&[Stmt]>,
    ) -> Result<Value, RuntimeError> {
        match self.exec_block_scoped(body) {
            Ok(_) => {
                if let Some(els) = els {
                    self.exec_block_scoped(els)?;
                }
                Ok(Value::Null)
            }
            Err(e) if e.is_signal() => Err(e),
            Err(e) => match catch {
                Some((name, catch_body)) => {
                    let caught = self.error_value(e);
                    let frame = Scope::child(&self.env, None);
                    if let Some(name) = name {
                        frame.borrow_mut().vars.insert(name.clone(), caught);
                    }
                    let saved = std::mem::replace(&mut self.env, frame);
                    let result = self.exec_block_raw(catch_body);
                    self.env = saved;
                    result?;
                    Ok(Value::Null)
                }
                None => Err(e),
            },
        }
    }

    /// The value `catch` binds: a raised value comes through unchanged,
    /// native failures turn into a type-tagged error object.
    fn error_value(&mut self, mut e: RuntimeError) -> Value {
        if let Some(value) = e.raised.take() {
            return value;
        }
        let obj = new_object(e.kind.label());
        obj.ns
            .public
            .borrow_mut()
            .insert("msg".to_string(), Value::Str(e.message.clone()));
        Value::Object(obj)
    }

    fn exec_switch(
        &mut self,
        subject: &Expr,
        cases: &[(Expr, Vec<Stmt>)],
        default: Option<&[Stmt]>,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        let key = self.eval_expr(subject)?;
        let mut matched = None;
        for (i, (pattern, _)) in cases.iter().enumerate() {
            let pattern_v = self.eval_expr(pattern)?;
            let eq = self.invoke_spec(&key, SpecName::Eq, vec![pattern_v], start)?;
            if self.bool_value(&eq, start)? {
                matched = Some(i);
                break;
            }
        }
        let Some(mut idx) = matched else {
            if let Some(default) = default {
                self.exec_block_scoped(default)?;
            }
            return Ok(Value::Null);
        };
        loop {
            match self.exec_block_scoped(&cases[idx].1) {
                Ok(_) => return Ok(Value::Null),
                Err(e) => {
                    if let Some(depth) = e.continue_depth {
                        // A continue re-raised by an inner loop is aimed at
                        // an outer loop, not at this switch.
                        if e.from_loop {
                            return Err(e);
                        }
                        idx += depth as usize;
                        if idx >= cases.len() {
                            return Ok(Value::Null);
                        }
                        continue;
                    }
                    if let Some(depth) = e.break_depth {
                        if depth <= 1 {
                            return Ok(Value::Null);
                        }
                        return Err(RuntimeError::break_signal(depth - 1).with_span(start));
                    }
                    return Err(e);
                }
            }
        }
    }

    fn check_version(&mut self, req: &VersionReq, start: usize) -> Result<Value, RuntimeError> {
        let host = self.version.clone();
        let ok = match req.op {
            VersionOp::Exact => req.low.matches_prefix(&host),
            VersionOp::Min => host >= req.low,
            VersionOp::Max => host <= req.low,
            VersionOp::Range => match &req.high {
                Some(high) => req.low <= host && host <= *high,
                None => false,
            },
        };
        if ok {
            return Ok(Value::Null);
        }
        let msg = match req.op {
            VersionOp::Exact => format!(
                "Current version (v{}) is not equal to the required version (v{})",
                host, req.low
            ),
            VersionOp::Min => format!(
                "Current version (v{}) is below the minimum set version allowed (v{})",
                host, req.low
            ),
            VersionOp::Max => format!(
                "Current version (v{}) is above the maximum set version allowed (v{})",
                host, req.low
            ),
            VersionOp::Range => {
                let high = req
                    .high
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                format!(
                    "Current version (v{}) outside of the allowed range (v{} - v{})",
                    host, req.low, high
                )
            }
        };
        Err(RuntimeError::version(msg).with_span(start))
    }

    fn exec_import(
        &mut self,
        names: &ImportNames,
        source: &str,
        _source_is_url: bool,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        let module = match self.modules.get(source) {
            Some(module) => module.clone(),
            None => {
                let module = self.load_module(source, start)?;
                self.modules.insert(source.to_string(), module.clone());
                module
            }
        };
        match names {
            ImportNames::Single(name) => {
                self.declare_value(DeclKind::Pub, name, module.clone(), start)?;
            }
            ImportNames::Members(members) => {
                for member in members {
                    let value = module.get_pub(member).ok_or_else(|| {
                        RuntimeError::attribute(format!("Attribute Not Found: {:?}", member))
                            .with_span(start)
                    })?;
                    let value = runtime::bind_if_method(value, &module);
                    self.declare_value(DeclKind::Pub, member, value, start)?;
                }
            }
        }
        Ok(module)
    }

    fn load_module(&mut self, source: &str, start: usize) -> Result<Value, RuntimeError> {
        if source == "types" {
            return Ok(builtin_types_module());
        }
        let program = match self.loader.as_mut() {
            Some(loader) => loader.load(source),
            None => Err(ModuleError::NotFound),
        };
        let program = match program {
            Ok(program) => program,
            Err(ModuleError::NotFound) => {
                return Err(RuntimeError::import(format!(
                    "Module {:?} could not be found",
                    source
                ))
                .with_span(start));
            }
            Err(ModuleError::InvalidModule(msg)) => {
                return Err(RuntimeError::import(format!(
                    "Module {:?} is invalid and could not be loaded: {}",
                    source, msg
                ))
                .with_span(start));
            }
        };

        // Module top level runs in its own object-bound root scope.
        let module_obj = new_object("module");
        let module_env = Scope::root(Some(ParentRef::Object(Rc::downgrade(&module_obj))));
        let saved_env = std::mem::replace(&mut self.env, module_env);
        let saved_obj = std::mem::replace(&mut self.module_obj, Rc::clone(&module_obj));
        let result = self.run(&program);
        self.env = saved_env;
        self.module_obj = saved_obj;
        result?;
        Ok(Value::Object(module_obj))
    }

    fn resolve_target(&mut self, target: &Target) -> Result<String, RuntimeError> {
        match target {
            Target::Name { name, .. } => Ok(name.clone()),
            Target::Dynamic { expr, start } => {
                let value = self.eval_expr(expr)?;
                self.str_value(&value, *start)
            }
        }
    }

    pub(crate) fn declare_value(
        &mut self,
        kind: DeclKind,
        name: &str,
        value: Value,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        match kind {
            DeclKind::Var | DeclKind::Let => {
                self.env
                    .borrow_mut()
                    .vars
                    .insert(name.to_string(), value.clone());
            }
            DeclKind::Pub => match runtime::current_binding(&self.env) {
                Some(owner) => owner.set_pub(name, value.clone()),
                None => {
                    self.env
                        .borrow_mut()
                        .vars
                        .insert(name.to_string(), value.clone());
                }
            },
            DeclKind::Priv => {
                let Some(owner) = runtime::current_binding(&self.env) else {
                    return Err(RuntimeError::value(
                        "private vars can only be set in an edit object statement",
                    )
                    .with_span(start));
                };
                owner.set_priv(name, value.clone());
            }
            DeclKind::Spec => {
                let Some(owner) = runtime::current_binding(&self.env) else {
                    return Err(
                        RuntimeError::value("specs can only be set while scoped").with_span(start)
                    );
                };
                let Some(spec) = SpecName::from_str(name) else {
                    return Err(RuntimeError::value(format!(
                        "there is no spec named {:?}",
                        name
                    ))
                    .with_span(start));
                };
                owner.set_spec(spec, value.clone());
            }
        }
        Ok(value)
    }

    // region expressions

    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Num(n) => Ok(Value::Num(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Pattern { source, start } => match regex::Regex::new(source) {
                Ok(re) => Ok(Value::Pattern(Rc::new(re))),
                Err(e) => {
                    Err(RuntimeError::value(format!("Invalid pattern: {}", e)).with_span(*start))
                }
            },
            Expr::Ident { name, start } => self.lookup_name(name, *start),
            Expr::DynamicIdent { expr, start } => {
                let value = self.eval_expr(expr)?;
                let name = self.str_value(&value, *start)?;
                self.lookup_name(&name, *start)
            }
            Expr::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                Ok(Value::list(values))
            }
            Expr::Block(stmts) => self.exec_block_scoped(stmts),
            Expr::If {
                cond,
                then,
                els,
                start,
            } => {
                let c = self.eval_expr(cond)?;
                if self.bool_value(&c, *start)? {
                    self.exec_block_scoped(then)
                } else if let Some(els) = els {
                    self.exec_block_scoped(els)
                } else {
                    Ok(Value::Null)
                }
            }
            Expr::Func {
                name,
                params,
                body,
                decos,
                is_struct,
                start,
            } => {
                let func = Value::Func(Rc::new(FuncData {
                    name: name.clone(),
                    params: Rc::new(params.clone()),
                    body: Rc::clone(body),
                    env: Rc::clone(&self.env),
                    parent: self.env.borrow().binding.clone(),
                    partial_args: Vec::new(),
                    partial_kwargs: Vec::new(),
                    is_struct: *is_struct,
                }));
                self.apply_decorators(func, decos, *start)
            }
            Expr::Property { name, body, .. } => {
                let getter = Value::Func(Rc::new(FuncData {
                    name: Some(name.clone()),
                    params: Rc::new(Vec::new()),
                    body: Rc::clone(body),
                    env: Rc::clone(&self.env),
                    parent: self.env.borrow().binding.clone(),
                    partial_args: Vec::new(),
                    partial_kwargs: Vec::new(),
                    is_struct: false,
                }));
                Ok(Value::Property(Rc::new(PropertyData {
                    getter,
                    setter: None,
                })))
            }
            Expr::TypeDecl {
                name,
                check,
                static_body,
                init,
                start,
            } => self.eval_type_decl(
                name,
                check.as_deref(),
                static_body.as_deref(),
                init.as_deref(),
                *start,
            ),
            Expr::TypeAtom { .. } => Ok(Value::Type(crate::value::new_type(
                "type",
                Some(crate::value::BuiltinKind::Type),
            ))),
            Expr::Unary { op, expr, start } => {
                let operand = self.eval_expr(expr)?;
                let spec = match op {
                    UnaryOp::Neg => SpecName::Neg,
                    UnaryOp::Pos => SpecName::Pos,
                    UnaryOp::Not => SpecName::Not,
                    UnaryOp::Bool => SpecName::Bool,
                };
                self.invoke_spec(&operand, spec, Vec::new(), *start)
            }
            Expr::Binary {
                op,
                left,
                right,
                start,
            } => self.eval_binary(*op, left, right, *start),
            Expr::Logic { op, left, right } => self.eval_logic(*op, left, right),
            Expr::Assign {
                target,
                value,
                start,
            } => {
                let value = self.eval_expr(value)?;
                let name = self.resolve_target(target)?;
                self.assign_name(&name, value.clone(), *start)?;
                Ok(value)
            }
            Expr::Call {
                callee,
                args,
                start,
            } => {
                let callee_v = self.eval_expr(callee)?;
                let (args, kwargs) = self.eval_args(args, *start)?;
                self.call_value(callee_v, args, kwargs, *start)
            }
            Expr::AltCall {
                callee,
                args,
                start,
            } => {
                let callee_v = self.eval_expr(callee)?;
                let (args, kwargs) = self.eval_args(args, *start)?;
                self.alt_call_value(callee_v, args, kwargs, *start)
            }
            Expr::GetAttr { obj, name, start } => {
                let obj_v = self.eval_expr(obj)?;
                self.invoke_spec(
                    &obj_v,
                    SpecName::GetAttr,
                    vec![Value::Str(name.clone())],
                    *start,
                )
            }
            Expr::Format { obj, spec, start } => {
                let obj_v = self.eval_expr(obj)?;
                match spec.as_str() {
                    "r" => self.invoke_spec(&obj_v, SpecName::Repr, Vec::new(), *start),
                    "s" => self.invoke_spec(&obj_v, SpecName::Str, Vec::new(), *start),
                    "h" => self.invoke_spec(&obj_v, SpecName::Hash, Vec::new(), *start),
                    other => self.invoke_spec(
                        &obj_v,
                        SpecName::Format,
                        vec![Value::Str(other.to_string())],
                        *start,
                    ),
                }
            }
            Expr::ScopeRef { levels, start } => {
                let mut scope = runtime::current_binding(&self.env).ok_or_else(|| {
                    RuntimeError::value("no scope object is exposed in the current scope")
                        .with_span(*start)
                })?;
                for _ in 1..*levels {
                    scope = scope.object_parent().ok_or_else(|| {
                        RuntimeError::value("Can't go any further").with_span(*start)
                    })?;
                }
                Ok(scope)
            }
            Expr::PrivRead {
                levels,
                name,
                start,
            } => {
                let mut scope = runtime::current_binding(&self.env).ok_or_else(|| {
                    RuntimeError::value("no private vars are being exposed in the current scope")
                        .with_span(*start)
                })?;
                for _ in 1..*levels {
                    scope = scope.object_parent().ok_or_else(|| {
                        RuntimeError::value("Can't go any further").with_span(*start)
                    })?;
                }
                if let Some(value) = scope.get_priv(name) {
                    return Ok(runtime::bind_if_method(value, &scope));
                }
                if name == "get_specs" {
                    return Ok(Value::native("get_specs", Some(scope)));
                }
                Err(
                    RuntimeError::attribute(format!("Private Var Not Found: {:?}", name))
                        .with_span(*start),
                )
            }
        }
    }

    fn lookup_name(&mut self, name: &str, start: usize) -> Result<Value, RuntimeError> {
        if let Some(value) = runtime::lookup(&self.env, name) {
            return Ok(value);
        }
        if let Some(value) = self.builtins.get(name) {
            return Ok(value.clone());
        }
        Err(RuntimeError::name(format!("Name {:?} is not defined", name)).with_span(start))
    }

    fn assign_name(&mut self, name: &str, value: Value, start: usize) -> Result<(), RuntimeError> {
        match runtime::resolve_slot(&self.env, name) {
            Some(Slot::Var(frame, name)) => {
                frame.borrow_mut().vars.insert(name, value);
                Ok(())
            }
            Some(Slot::Priv(owner, name)) => {
                owner.set_priv(&name, value);
                Ok(())
            }
            Some(Slot::Pub(owner, name)) => {
                if let Some(current) = owner.get_pub(&name) {
                    if matches!(current, Value::Property(_)) {
                        self.invoke_spec(&current, SpecName::Set, vec![value], start)?;
                        return Ok(());
                    }
                }
                owner.set_pub(&name, value);
                Ok(())
            }
            None => {
                Err(RuntimeError::name(format!("Name {:?} is not defined", name)).with_span(start))
            }
        }
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        start: usize,
    ) -> Result<Value, RuntimeError> {
        let l = self.eval_expr(left)?;
        let r = self.eval_expr(right)?;
        let (target, arg, spec) = match op {
            BinOp::Add => (l, r, SpecName::Add),
            BinOp::Sub => (l, r, SpecName::Sub),
            BinOp::Mul => (l, r, SpecName::Mul),
            BinOp::Div => (l, r, SpecName::Div),
            BinOp::Pow => (l, r, SpecName::Pow),
            BinOp::Eq => (l, r, SpecName::Eq),
            BinOp::Ne => (l, r, SpecName::Ne),
            BinOp::Lt => (l, r, SpecName::Lt),
            BinOp::Le => (l, r, SpecName::Le),
            BinOp::Gt => (l, r, SpecName::Gt),
            BinOp::Ge => (l, r, SpecName::Ge),
            BinOp::Or => (l, r, SpecName::Or),
            BinOp::And => (l, r, SpecName::And),
            // `x in y` asks the container on the right.
            BinOp::In => (r, l, SpecName::Contains),
            BinOp::Contains => (l, r, SpecName::Contains),
            BinOp::IdEq => {
                return Ok(Value::Bool(match (&l, &r) {
                    (Value::Num(_), _) | (Value::Str(_), _) | (Value::Bool(_), _)
                    | (Value::Null, _) => crate::value::values_equal(&l, &r),
                    _ => l.identity() == r.identity(),
                }));
            }
        };
        self.invoke_spec(&target, spec, vec![arg], start)
    }

    fn eval_logic(
        &mut self,
        op: LogicOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Value, RuntimeError> {
        let start = 0;
        let l = self.eval_expr(left)?;
        match op {
            LogicOp::OrOr => {
                if self.bool_value(&l, start)? {
                    return Ok(l);
                }
                let r = self.eval_expr(right)?;
                if self.bool_value(&r, start)? {
                    Ok(r)
                } else {
                    Ok(Value::Null)
                }
            }
            LogicOp::AndAnd => {
                if !self.bool_value(&l, start)? {
                    return Ok(Value::Bool(false));
                }
                let r = self.eval_expr(right)?;
                Ok(Value::Bool(self.bool_value(&r, start)?))
            }
        }
    }

    fn eval_args(
        &mut self,
        args: &[CallArg],
        start: usize,
    ) -> Result<(Vec<Value>, Vec<(String, Value)>), RuntimeError> {
        let mut positional = Vec::new();
        let mut keywords: Vec<(String, Value)> = Vec::new();
        let mut dynamic: Vec<(String, Value)> = Vec::new();

        fn push_kw(
            list: &mut Vec<(String, Value)>,
            other: &[(String, Value)],
            name: String,
            value: Value,
            start: usize,
        ) -> Result<(), RuntimeError> {
            if other.iter().any(|(k, _)| *k == name) || list.iter().any(|(k, _)| *k == name) {
                return Err(RuntimeError::argument(format!(
                    "Duplicate keyword argument {:?}",
                    name
                ))
                .with_span(start));
            }
            list.push((name, value));
            Ok(())
        }

        for arg in args {
            match arg {
                CallArg::Pos(expr) => positional.push(self.eval_expr(expr)?),
                CallArg::Spread(expr) => {
                    let value = self.eval_expr(expr)?;
                    positional.extend(self.iterate(&value, start)?);
                }
                CallArg::Kw { name, value } => {
                    let value = self.eval_expr(value)?;
                    push_kw(&mut keywords, &dynamic, name.clone(), value, start)?;
                }
                CallArg::KwSpread(expr) => {
                    let value = self.eval_expr(expr)?;
                    let Value::Dict(d) = &value else {
                        let rendered = self.repr_value(&value, start)?;
                        return Err(RuntimeError::value(format!(
                            "Can not unpack, {} is not a dictionary",
                            rendered
                        ))
                        .with_span(start));
                    };
                    let entries = d.borrow().entries.clone();
                    for (_, key, val) in entries {
                        let name = self.str_value(&key, start)?;
                        push_kw(&mut keywords, &dynamic, name, val, start)?;
                    }
                }
                CallArg::DynKw { name, value } => {
                    let name_v = self.eval_expr(name)?;
                    let name = self.str_value(&name_v, start)?;
                    let value = self.eval_expr(value)?;
                    push_kw(&mut dynamic, &keywords, name, value, start)?;
                }
            }
        }
        keywords.extend(dynamic);
        Ok((positional, keywords))
    }

    fn eval_type_decl(
        &mut self,
        name: &str,
        check: Option<&Expr>,
        static_body: Option<&[Stmt]>,
        init: Option<&Expr>,
        _start: usize,
    ) -> Result<Value, RuntimeError> {
        let ty = crate::value::new_type(name, None);
        *ty.parent.borrow_mut() = self.env.borrow().binding.clone();
        let tv = Value::Type(Rc::clone(&ty));

        if let Some(init_expr) = init {
            let init_v = self.eval_expr(init_expr)?;
            *ty.init.borrow_mut() = Some(init_v);
        }

        if static_body.is_some() || check.is_some() {
            let frame = Scope::child(&self.env, ParentRef::from_value(&tv));
            let saved = std::mem::replace(&mut self.env, frame);
            let mut result = Ok(Value::Null);
            if let Some(body) = static_body {
                result = self.exec_block_raw(body);
            }
            if result.is_ok() {
                if let Some(check_expr) = check {
                    result = self.eval_expr(check_expr).map(|check_v| {
                        tv.set_pub("check", check_v);
                        Value::Null
                    });
                }
            }
            self.env = saved;
            result?;
        }
        Ok(tv)
    }
}

#[cfg(test)]
mod tests {
    use super::Interpreter;
    use crate::value::ErrorKind;

    #[test]
    fn arithmetic_and_print() {
        let mut interp = Interpreter::new();
        interp.run_source("print(1 + 2); print(3 * 4);").unwrap();
        assert_eq!(interp.output(), "3\n12\n");
    }

    #[test]
    fn variables_and_fstrings() {
        let mut interp = Interpreter::new();
        interp
            .run_source("var x = 2; x = x + 3; print(f\"got {x}\");")
            .unwrap();
        assert_eq!(interp.output(), "got 5\n");
    }

    #[test]
    fn if_else_branches() {
        let mut interp = Interpreter::new();
        interp
            .run_source("var x = 1; if x == 1 { print(\"yes\"); } else { print(\"no\"); }")
            .unwrap();
        assert_eq!(interp.output(), "yes\n");
    }

    #[test]
    fn while_loop_counts() {
        let mut interp = Interpreter::new();
        interp
            .run_source("var x = 0; while x < 3 { print(x); x = x + 1; }")
            .unwrap();
        assert_eq!(interp.output(), "0\n1\n2\n");
    }

    #[test]
    fn assignment_to_undeclared_name_fails() {
        let mut interp = Interpreter::new();
        let err = interp.run_source("y = 5;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Name);
    }

    #[test]
    fn embedders_can_define_builtins() {
        let mut interp = Interpreter::new();
        interp.define_builtin("answer", crate::value::Value::Num(42.0));
        interp.run_source("print(answer);").unwrap();
        assert_eq!(interp.output(), "42\n");
    }

    #[test]
    fn programs_parse_once_and_run_many_times() {
        let program = crate::parse("print(1);").unwrap();
        let mut interp = Interpreter::new();
        interp.run(&program).unwrap();
        interp.run(&program).unwrap();
        assert_eq!(interp.output(), "1\n1\n");
    }
}
