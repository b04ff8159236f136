use crate::ast::{Expr, FunctionDecl, LiteralValue, Stmt};

/// Renders AST nodes as parenthesised prefix notation, e.g. `(+ 1.0 (group 2.0))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                self.print(left),
                self.print(right)
            ),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, self.print(right))
            }

            Expr::Literal(value) => match value {
                LiteralValue::Str(s) => s.clone(),
                other => other.to_string(),
            },

            Expr::Grouping(inner) => format!("(group {})", self.print(inner)),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, self.print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out = format!("(call {}", self.print(callee));

                for arg in arguments {
                    out.push(' ');
                    out.push_str(&self.print(arg));
                }

                out.push(')');
                out
            }

            Expr::Get { object, name } => format!("(. {} {})", self.print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                self.print(object),
                name.lexeme,
                self.print(value)
            ),

            Expr::This { .. } => "this".to_string(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", self.print(expr)),

            Stmt::Print(expr) => format!("(print {})", self.print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} = {})", name.lexeme, self.print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => self.print_block("block", statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if-else {} {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch),
                    self.print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                self.print(condition),
                self.print_stmt(body)
            ),

            Stmt::Function(decl) => self.print_function("fun", decl),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", self.print(value)),
                None => "(return)".to_string(),
            },

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut out = format!("(class {}", name.lexeme);

                if let Some(superclass) = superclass {
                    out.push_str(&format!(" < {}", self.print(superclass)));
                }

                for method in methods {
                    out.push(' ');
                    out.push_str(&self.print_function("method", method));
                }

                out.push(')');
                out
            }
        }
    }

    fn print_block(&self, head: &str, statements: &[Stmt]) -> String {
        let mut out = format!("({}", head);

        for stmt in statements {
            out.push(' ');
            out.push_str(&self.print_stmt(stmt));
        }

        out.push(')');
        out
    }

    fn print_function(&self, kind: &str, decl: &FunctionDecl) -> String {
        let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
        let head = format!("{} {}({})", kind, decl.name.lexeme, params.join(" "));

        self.print_block(&head, &decl.body)
    }
}
