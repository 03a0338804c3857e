//! Lowers a tree of [`Sexpr`] into the typed [`Module`]/[`Expr`]/[`Pattern`]
//! AST that the elaborator consumes.
//!
//! Errors here are `E2xx`-class ("malformed form") parse errors: they are
//! local-recovery errors, the same way the elaborator recovers from type
//! errors -- a malformed sub-form becomes a synthetic placeholder so the
//! rest of the module can still be lowered and elaborated.

use vaisto_common::Loc;

use crate::ast::*;
use crate::error::ParseError;
use crate::reader::{Sexpr, SexprKind};

pub struct Lowerer {
    errors: Vec<ParseError>,
}

impl Lowerer {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn err(&mut self, message: impl Into<String>, loc: Loc) {
        self.errors.push(ParseError::new(message, loc));
    }

    /// A placeholder expression substituted for a malformed sub-form so that
    /// lowering (and later elaboration) can continue past the error.
    fn bad_expr(&self, loc: Loc) -> Expr {
        Expr::Atom("malformed".to_string(), loc)
    }

    pub fn lower_module(&mut self, forms: &[Sexpr]) -> Module {
        let mut module = Module::default();
        let mut top_exprs: Vec<Expr> = Vec::new();

        for form in forms {
            let head = form.as_list().and_then(|items| items.first()).and_then(|s| s.as_symbol());
            match head {
                Some("ns") => self.lower_ns(form, &mut module),
                Some("import") => self.lower_import(form, &mut module),
                Some("defn") => {
                    if let Some(def) = self.lower_fn_def(form) {
                        module.items.push(Item::Fn(def));
                    }
                }
                Some("deftype") => {
                    if let Some(def) = self.lower_sum_type(form) {
                        module.items.push(Item::SumType(def));
                    }
                }
                Some("defrecord") => {
                    if let Some(def) = self.lower_record(form) {
                        module.items.push(Item::Record(def));
                    }
                }
                Some("defclass") => {
                    if let Some(def) = self.lower_class(form) {
                        module.items.push(Item::Class(def));
                    }
                }
                Some("instance") => {
                    if let Some(def) = self.lower_instance(form) {
                        module.items.push(Item::Instance(def));
                    }
                }
                Some("process") => {
                    if let Some(def) = self.lower_process(form) {
                        module.items.push(Item::Process(def));
                    }
                }
                _ => top_exprs.push(self.lower_expr(form)),
            }
        }

        module.top_expr = match top_exprs.len() {
            0 => None,
            1 => Some(top_exprs.into_iter().next().unwrap()),
            _ => {
                let loc = top_exprs.first().unwrap().loc().merge(top_exprs.last().unwrap().loc());
                Some(Expr::Do(top_exprs, loc))
            }
        };
        module
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    // ── Top-level items ──────────────────────────────────────────────

    fn lower_ns(&mut self, form: &Sexpr, module: &mut Module) {
        let items = form.as_list().unwrap();
        match items.get(1).and_then(|s| s.as_symbol()) {
            Some(name) => module.name = Some(name.to_string()),
            None => self.err("malformed `ns`: expected a module name", form.loc),
        }
    }

    fn lower_import(&mut self, form: &Sexpr, module: &mut Module) {
        let items = form.as_list().unwrap();
        let Some(name) = items.get(1).and_then(|s| s.as_symbol()) else {
            self.err("malformed `import`: expected a module name", form.loc);
            return;
        };
        let mut alias = None;
        if let Some(as_kw) = items.get(2).and_then(|s| s.as_symbol()) {
            if as_kw == ":as" || as_kw == "as" {
                alias = items.get(3).and_then(|s| s.as_symbol()).map(|s| s.to_string());
            }
        }
        module.imports.push(ImportDecl { module: name.to_string(), alias, loc: form.loc });
    }

    fn lower_fn_def(&mut self, form: &Sexpr) -> Option<FnDef> {
        let items = form.as_list().unwrap();
        let name = items.get(1).and_then(|s| s.as_symbol());
        let params = items.get(2).and_then(|s| s.as_vector());
        let (Some(name), Some(params)) = (name, params) else {
            self.err("malformed `defn`: expected `(defn name [params] body)`", form.loc);
            return None;
        };
        let params = self.lower_param_list(params);
        let body_forms = &items[3..];
        let body = self.lower_body(body_forms, form.loc);
        Some(FnDef { name: name.to_string(), params, body, loc: form.loc })
    }

    fn lower_param_list(&mut self, items: &[Sexpr]) -> Vec<String> {
        items
            .iter()
            .filter_map(|s| match s.as_symbol() {
                Some(name) => Some(name.to_string()),
                None => {
                    self.err("expected a parameter name", s.loc);
                    None
                }
            })
            .collect()
    }

    /// Multiple trailing forms are wrapped in an implicit `do`.
    fn lower_body(&mut self, forms: &[Sexpr], loc_if_empty: Loc) -> Expr {
        match forms.len() {
            0 => {
                self.err("expected a body expression", loc_if_empty);
                self.bad_expr(loc_if_empty)
            }
            1 => self.lower_expr(&forms[0]),
            _ => {
                let loc = forms[0].loc.merge(forms.last().unwrap().loc);
                Expr::Do(forms.iter().map(|f| self.lower_expr(f)).collect(), loc)
            }
        }
    }

    fn lower_sum_type(&mut self, form: &Sexpr) -> Option<SumTypeDef> {
        let items = form.as_list().unwrap();
        let Some(name) = items.get(1).and_then(|s| s.as_symbol()) else {
            self.err("malformed `deftype`: expected a type name", form.loc);
            return None;
        };
        let mut variants = Vec::new();
        let mut deriving = Vec::new();
        for rest in &items[2..] {
            let Some(children) = rest.as_list() else {
                self.err("expected a variant or `deriving` clause", rest.loc);
                continue;
            };
            if let Some("deriving") = children.first().and_then(|s| s.as_symbol()) {
                deriving = self.lower_deriving(children, rest.loc);
                continue;
            }
            let Some(ctor) = children.first().and_then(|s| s.as_symbol()) else {
                self.err("expected a constructor name", rest.loc);
                continue;
            };
            let fields = self.lower_param_list(&children[1..]);
            variants.push(VariantDef { ctor: ctor.to_string(), fields, loc: rest.loc });
        }
        Some(SumTypeDef { name: name.to_string(), variants, deriving, loc: form.loc })
    }

    fn lower_deriving(&mut self, children: &[Sexpr], loc: Loc) -> Vec<String> {
        match children.get(1).and_then(|s| s.as_vector()) {
            Some(classes) => self.lower_param_list(classes),
            None => {
                self.err("malformed `deriving`: expected `(deriving [Class…])`", loc);
                Vec::new()
            }
        }
    }

    fn lower_record(&mut self, form: &Sexpr) -> Option<RecordDef> {
        let items = form.as_list().unwrap();
        let name = items.get(1).and_then(|s| s.as_symbol());
        let fields = items.get(2).and_then(|s| s.as_vector());
        let (Some(name), Some(fields)) = (name, fields) else {
            self.err("malformed `defrecord`: expected `(defrecord Name [fields])`", form.loc);
            return None;
        };
        let fields = self.lower_param_list(fields);
        let mut deriving = Vec::new();
        for rest in &items[3..] {
            if let Some(children) = rest.as_list() {
                if let Some("deriving") = children.first().and_then(|s| s.as_symbol()) {
                    deriving = self.lower_deriving(children, rest.loc);
                }
            }
        }
        Some(RecordDef { name: name.to_string(), fields, deriving, loc: form.loc })
    }

    fn lower_class(&mut self, form: &Sexpr) -> Option<ClassDef> {
        let items = form.as_list().unwrap();
        let name = items.get(1).and_then(|s| s.as_symbol());
        let tyvar = items.get(2).and_then(|s| s.as_vector()).and_then(|v| v.first()).and_then(|s| s.as_symbol());
        let (Some(name), Some(tyvar)) = (name, tyvar) else {
            self.err("malformed `defclass`: expected `(defclass Name [tyvar] methods…)`", form.loc);
            return None;
        };
        let mut methods = Vec::new();
        for rest in &items[3..] {
            let Some(children) = rest.as_list() else {
                self.err("expected a method signature", rest.loc);
                continue;
            };
            let Some(mname) = children.first().and_then(|s| s.as_symbol()) else {
                self.err("expected a method name", rest.loc);
                continue;
            };
            let params = children.get(1).and_then(|s| s.as_vector()).map(|p| self.lower_param_list(p)).unwrap_or_default();
            // Everything after the return-type placeholder (children[2], unused --
            // the language has no type annotations here) up to the end is an
            // optional default body.
            let default = children.get(3).map(|d| self.lower_expr(d));
            methods.push(MethodSig { name: mname.to_string(), params, default, loc: rest.loc });
        }
        Some(ClassDef { name: name.to_string(), tyvar: tyvar.to_string(), methods, loc: form.loc })
    }

    fn lower_instance(&mut self, form: &Sexpr) -> Option<InstanceDef> {
        let items = form.as_list().unwrap();
        let Some(class) = items.get(1).and_then(|s| s.as_symbol()) else {
            self.err("malformed `instance`: expected a class name", form.loc);
            return None;
        };
        let Some(head_sexpr) = items.get(2) else {
            self.err("malformed `instance`: expected a head", form.loc);
            return None;
        };
        let head = match &head_sexpr.kind {
            SexprKind::Symbol(name) => InstanceHead { name: name.clone(), args: Vec::new() },
            SexprKind::List(parts) => {
                let Some(name) = parts.first().and_then(|s| s.as_symbol()) else {
                    self.err("malformed instance head", head_sexpr.loc);
                    return None;
                };
                let args = self.lower_param_list(&parts[1..]);
                InstanceHead { name: name.to_string(), args }
            }
            _ => {
                self.err("malformed instance head", head_sexpr.loc);
                return None;
            }
        };

        let mut rest = &items[3..];
        let mut constraints = Vec::new();
        if let Some(first) = rest.first() {
            if let Some(children) = first.as_list() {
                if let Some("where") = children.first().and_then(|s| s.as_symbol()) {
                    if let Some(vec) = children.get(1).and_then(|s| s.as_vector()) {
                        for c in vec {
                            if let Some(cs) = c.as_list() {
                                if let (Some(cname), Some(cvar)) =
                                    (cs.first().and_then(|s| s.as_symbol()), cs.get(1).and_then(|s| s.as_symbol()))
                                {
                                    constraints.push((cname.to_string(), cvar.to_string()));
                                }
                            }
                        }
                    }
                    rest = &rest[1..];
                }
            }
        }

        let mut methods = Vec::new();
        for m in rest {
            let Some(children) = m.as_list() else {
                self.err("expected a method definition", m.loc);
                continue;
            };
            let Some(mname) = children.first().and_then(|s| s.as_symbol()) else {
                self.err("expected a method name", m.loc);
                continue;
            };
            let params = children.get(1).and_then(|s| s.as_vector()).map(|p| self.lower_param_list(p)).unwrap_or_default();
            let body = self.lower_body(&children[2..], m.loc);
            methods.push(InstanceMethod { name: mname.to_string(), params, body });
        }

        Some(InstanceDef { class: class.to_string(), head, constraints, methods, loc: form.loc })
    }

    fn lower_process(&mut self, form: &Sexpr) -> Option<ProcessDef> {
        let items = form.as_list().unwrap();
        let name = items.get(1).and_then(|s| s.as_symbol());
        let init_sexpr = items.get(2);
        let (Some(name), Some(init_sexpr)) = (name, init_sexpr) else {
            self.err("malformed `process`: expected `(process name init :tag body…)`", form.loc);
            return None;
        };
        let init = self.lower_expr(init_sexpr);

        let mut arms = Vec::new();
        let mut i = 3;
        while i < items.len() {
            let Some(tag) = (match &items[i].kind {
                SexprKind::Keyword(t) => Some(t.clone()),
                _ => None,
            }) else {
                self.err("expected a `:tag`", items[i].loc);
                i += 1;
                continue;
            };
            i += 1;
            let params = match items.get(i).and_then(|s| s.as_vector()) {
                Some(v) => {
                    i += 1;
                    self.lower_param_list(v)
                }
                None => Vec::new(),
            };
            let Some(body_sexpr) = items.get(i) else {
                self.err(format!("expected a body for tag `:{tag}`"), form.loc);
                break;
            };
            let body = self.lower_expr(body_sexpr);
            i += 1;
            arms.push(ProcessArm { tag, params, body });
        }

        Some(ProcessDef { name: name.to_string(), init, arms, loc: form.loc })
    }

    // ── Expressions ──────────────────────────────────────────────────

    pub fn lower_expr(&mut self, s: &Sexpr) -> Expr {
        match &s.kind {
            SexprKind::Int(v) => Expr::Lit(Literal::Int(*v), s.loc),
            SexprKind::Float(v) => Expr::Lit(Literal::Float(*v), s.loc),
            SexprKind::Bool(v) => Expr::Lit(Literal::Bool(*v), s.loc),
            SexprKind::Str(v) => Expr::Lit(Literal::Str(v.clone()), s.loc),
            SexprKind::Keyword(tag) => Expr::Atom(tag.clone(), s.loc),
            SexprKind::Symbol(name) => Expr::Var(name.clone(), s.loc),
            SexprKind::Vector(items) => {
                Expr::List(items.iter().map(|i| self.lower_expr(i)).collect(), s.loc)
            }
            SexprKind::List(items) => self.lower_form(items, s.loc),
        }
    }

    fn lower_form(&mut self, items: &[Sexpr], loc: Loc) -> Expr {
        let head = items.first().and_then(|s| s.as_symbol());
        match head {
            Some("if") if items.len() == 4 => Expr::If {
                cond: Box::new(self.lower_expr(&items[1])),
                then: Box::new(self.lower_expr(&items[2])),
                else_: Box::new(self.lower_expr(&items[3])),
                loc,
            },
            Some("if") => {
                self.err("malformed `if`: expected `(if cond then else)`", loc);
                self.bad_expr(loc)
            }
            Some("let") if items.len() >= 3 => {
                let Some(bind_vec) = items[1].as_vector() else {
                    self.err("malformed `let`: expected a binding vector", items[1].loc);
                    return self.bad_expr(loc);
                };
                if bind_vec.len() % 2 != 0 {
                    self.err("malformed `let`: bindings must be name/expr pairs", items[1].loc);
                    return self.bad_expr(loc);
                }
                let mut bindings = Vec::new();
                let mut it = bind_vec.iter();
                while let (Some(name_s), Some(val_s)) = (it.next(), it.next()) {
                    match name_s.as_symbol() {
                        Some(name) => bindings.push((name.to_string(), self.lower_expr(val_s))),
                        None => self.err("expected a binding name", name_s.loc),
                    }
                }
                let body = self.lower_body(&items[2..], loc);
                Expr::Let { bindings, body: Box::new(body), loc }
            }
            Some("fn") if items.len() >= 3 => {
                let Some(params) = items[1].as_vector() else {
                    self.err("malformed `fn`: expected a parameter vector", items[1].loc);
                    return self.bad_expr(loc);
                };
                let params = self.lower_param_list(params);
                let body = self.lower_body(&items[2..], loc);
                Expr::Fn { params, body: Box::new(body), loc }
            }
            Some("do") => Expr::Do(items[1..].iter().map(|i| self.lower_expr(i)).collect(), loc),
            Some("tuple") => Expr::Tuple(items[1..].iter().map(|i| self.lower_expr(i)).collect(), loc),
            Some("match") if items.len() >= 2 => {
                let scrutinee = Box::new(self.lower_expr(&items[1]));
                let mut arms = Vec::new();
                for arm_s in &items[2..] {
                    let Some(pair) = arm_s.as_vector() else {
                        self.err("expected a `[pattern body]` match arm", arm_s.loc);
                        continue;
                    };
                    if pair.len() != 2 {
                        self.err("malformed match arm: expected `[pattern body]`", arm_s.loc);
                        continue;
                    }
                    let pattern = self.lower_pattern(&pair[0]);
                    let body = self.lower_expr(&pair[1]);
                    arms.push(MatchArm { pattern, body });
                }
                Expr::Match { scrutinee, arms, loc }
            }
            Some(".") if items.len() == 3 => {
                let record = Box::new(self.lower_expr(&items[1]));
                let field = match &items[2].kind {
                    SexprKind::Keyword(tag) => tag.clone(),
                    _ => {
                        self.err("expected a `:field` tag", items[2].loc);
                        String::new()
                    }
                };
                Expr::FieldAccess { record, field, loc }
            }
            Some("spawn") if items.len() == 3 => {
                let Some(process) = items[1].as_symbol() else {
                    self.err("expected a process name", items[1].loc);
                    return self.bad_expr(loc);
                };
                let init = Box::new(self.lower_expr(&items[2]));
                Expr::Spawn { process: process.to_string(), init, loc }
            }
            Some("!") if items.len() == 3 => Expr::Send {
                safe: true,
                pid: Box::new(self.lower_expr(&items[1])),
                msg: Box::new(self.lower_expr(&items[2])),
                loc,
            },
            Some("!!") if items.len() == 3 => Expr::Send {
                safe: false,
                pid: Box::new(self.lower_expr(&items[1])),
                msg: Box::new(self.lower_expr(&items[2])),
                loc,
            },
            _ => {
                if items.is_empty() {
                    self.err("empty call", loc);
                    return self.bad_expr(loc);
                }
                let func = Box::new(self.lower_expr(&items[0]));
                let args = items[1..].iter().map(|i| self.lower_expr(i)).collect();
                Expr::Call { func, args, loc }
            }
        }
    }

    // ── Patterns ─────────────────────────────────────────────────────

    fn lower_pattern(&mut self, s: &Sexpr) -> Pattern {
        match &s.kind {
            SexprKind::Int(v) => Pattern::Lit(Literal::Int(*v), s.loc),
            SexprKind::Float(v) => Pattern::Lit(Literal::Float(*v), s.loc),
            SexprKind::Bool(v) => Pattern::Lit(Literal::Bool(*v), s.loc),
            SexprKind::Str(v) => Pattern::Lit(Literal::Str(v.clone()), s.loc),
            SexprKind::Keyword(tag) => Pattern::Atom(tag.clone(), s.loc),
            SexprKind::Symbol(name) if name == "_" => Pattern::Wildcard(s.loc),
            SexprKind::Symbol(name) => Pattern::Var(name.clone(), s.loc),
            SexprKind::Vector(items) => self.lower_vector_pattern(items, s.loc),
            SexprKind::List(items) => self.lower_ctor_pattern(items, s.loc),
        }
    }

    fn lower_vector_pattern(&mut self, items: &[Sexpr], loc: Loc) -> Pattern {
        if let Some(bar_idx) = items.iter().position(|s| s.as_symbol() == Some("|")) {
            let heads = &items[..bar_idx];
            let tail_items = &items[bar_idx + 1..];
            if tail_items.len() != 1 {
                self.err("malformed cons pattern: expected `[h | t]`", loc);
                return Pattern::Wildcard(loc);
            }
            let mut tail = self.lower_pattern(&tail_items[0]);
            for head in heads.iter().rev() {
                let head_pat = self.lower_pattern(head);
                tail = Pattern::Cons { head: Box::new(head_pat), tail: Box::new(tail), loc };
            }
            return tail;
        }
        Pattern::List(items.iter().map(|i| self.lower_pattern(i)).collect(), loc)
    }

    fn lower_ctor_pattern(&mut self, items: &[Sexpr], loc: Loc) -> Pattern {
        if let Some("tuple") = items.first().and_then(|s| s.as_symbol()) {
            return Pattern::Tuple(items[1..].iter().map(|i| self.lower_pattern(i)).collect(), loc);
        }
        let Some(name) = items.first().and_then(|s| s.as_symbol()) else {
            self.err("expected a constructor name", loc);
            return Pattern::Wildcard(loc);
        };
        let args = items[1..].iter().map(|i| self.lower_pattern(i)).collect();
        Pattern::Ctor { name: name.to_string(), args, loc }
    }
}

impl Default for Lowerer {
    fn default() -> Self {
        Self::new()
    }
}
