//! End-to-end tests: Java text in, Go text out.
//!
//! Rendered Go is snapshotted with tabs shown as four spaces.
//! Run `cargo insta review` to update snapshots after intentional changes.

use javago_transpile::{
    DiagnosticKind, GO_WRITER, SourceFile, TranslateOptions, Translation, Writer, translate,
};

fn run(files: &[(&str, &str)]) -> Translation {
    run_with(files, &TranslateOptions::default())
}

fn run_with(files: &[(&str, &str)], options: &TranslateOptions) -> Translation {
    let sources: Vec<SourceFile> = files
        .iter()
        .map(|(id, source)| SourceFile::new(*id, *source))
        .collect();
    translate(&sources, options)
}

fn render(translation: &Translation, id: &str) -> String {
    let file = translation.file(id).expect("file was not translated");
    GO_WRITER.write(&file.go).replace('\t', "    ")
}

fn single(source: &str) -> String {
    let translation = run(&[("Main.java", source)]);
    assert!(translation.is_success(), "{:?}", translation.failures);
    render(&translation, "Main.java")
}

// ============================================================================
// Classes
// ============================================================================

mod classes {
    use super::*;

    #[test]
    fn field_constructor_and_getter() {
        let go = single(
            r#"
public class Test {
    private int value;

    public Test(int val) {
        this.value = val;
    }

    public int getValue() {
        return value;
    }
}
"#,
        );
        insta::assert_snapshot!(go, @r"
        package main

        type Test struct {
            value int
        }

        func NewTest(val int) *Test {
            this := &Test{}
            this.value = val
            return this
        }

        func (this *Test) GetValue() int {
            return this.value
        }
        ");
    }

    #[test]
    fn linked_list_add() {
        let go = single(
            r#"
public class IntList {
    private Node head;
    private Node tail;
    private int size;

    public void add(int element) {
        Node n = new Node(element);
        if (head == null) {
            head = n;
            tail = n;
        } else {
            tail.next = n;
            tail = n;
        }
        size++;
    }
}

class Node {
    int value;
    Node next;

    Node(int value) {
        this.value = value;
    }
}
"#,
        );
        insta::assert_snapshot!(go, @r"
        package main

        type IntList struct {
            head *node
            tail *node
            size int
        }

        func (this *IntList) Add(element int) {
            var n *node = newNode(element)
            if this.head == nil {
                this.head = n
                this.tail = n
            } else {
                this.tail.next = n
                this.tail = n
            }
            this.size++
        }

        func NewIntList() *IntList {
            this := &IntList{}
            return this
        }

        type node struct {
            value int
            next *node
        }

        func newNode(value int) *node {
            this := &node{}
            this.value = value
            return this
        }
        ");
    }

    #[test]
    fn implicit_constructor_runs_field_initializers() {
        let go = single("class Counter { int count = 10; }");
        assert!(go.contains("func newCounter() *counter {"), "{go}");
        assert!(go.contains("this.count = 10"), "{go}");
    }

    #[test]
    fn overloads_get_suffixes() {
        let go = single(
            r#"
public class Calc {
    public int add(int a, int b) { return a + b; }
    public int add(int a, int b, int c) { return a + b + c; }
    public int sum() { return add(1, 2) + add(1, 2, 3); }
}
"#,
        );
        assert!(go.contains("func (this *Calc) Add(a int, b int) int {"), "{go}");
        assert!(go.contains("func (this *Calc) Add0(a int, b int, c int) int {"), "{go}");
        assert!(go.contains("return this.Add(1, 2) + this.Add0(1, 2, 3)"), "{go}");
    }

    #[test]
    fn nested_classes_are_flattened() {
        let go = single(
            r#"
public class Outer {
    private Inner inner;

    private static class Inner {
        int depth;
    }
}
"#,
        );
        assert!(go.contains("type Outer struct {\n    inner *Outerinner\n}"), "{go}");
        assert!(go.contains("type Outerinner struct {\n    depth int\n}"), "{go}");
    }

    #[test]
    fn reserved_words_are_renamed() {
        let go = single("class Box { int type; void range(int len) { int map = len; } }");
        assert!(go.contains("type0 int"), "{go}");
        assert!(go.contains("func (this *box) range0(len0 int) {"), "{go}");
        assert!(go.contains("var map0 int = len0"), "{go}");
    }

    #[test]
    fn inheritance_embeds_parent() {
        let go = single(
            r#"
class Base { int id; }
class Derived extends Base { int extra; }
"#,
        );
        assert!(go.contains("type derived struct {\n    base\n    extra int\n}"), "{go}");
        assert!(go.contains("this.base = *newBase()"), "{go}");
    }

    #[test]
    fn main_method() {
        let go = single(
            r#"
public class App {
    public static void main(String[] args) {
        System.out.println("hi");
    }
}
"#,
        );
        insta::assert_snapshot!(go, @r#"
        package main

        import (
            "fmt"
            "os"
        )

        type App struct{}

        func main() {
            args := os.Args[1:]
            _ = args
            fmt.Println("hi")
        }

        func NewApp() *App {
            this := &App{}
            return this
        }
        "#);
    }
}

// ============================================================================
// Statements
// ============================================================================

mod statements {
    use super::*;

    #[test]
    fn counting_loop() {
        let go = single(
            r#"
class Loop {
    static void run() {
        for (int i = 0; i < 10; i++) {
            System.out.println(i);
        }
    }
}
"#,
        );
        insta::assert_snapshot!(go, @r#"
        package main

        import "fmt"

        type loop struct{}

        func run() {
            for i := 0; i < 10; i++ {
                fmt.Println(i)
            }
        }

        func newLoop() *loop {
            this := &loop{}
            return this
        }
        "#);
    }

    #[test]
    fn do_while_breaks_at_the_end() {
        let go = single(
            r#"
class Loop {
    static void run() {
        int i = 0;
        do {
            i++;
        } while (i < 10);
    }
}
"#,
        );
        insta::assert_snapshot!(go, @r"
        package main

        type loop struct{}

        func run() {
            var i int = 0
            for {
                i++
                if !(i < 10) {
                    break
                }
            }
        }

        func newLoop() *loop {
            this := &loop{}
            return this
        }
        ");
    }

    #[test]
    fn switch_fallthrough() {
        let go = single(
            r#"
class S {
    static int f(int x) {
        int r = 0;
        switch (x) {
            case 1:
            case 2:
                r = 1;
                break;
            case 3:
                r = 3;
            default:
                r = 4;
        }
        return r;
    }
}
"#,
        );
        insta::assert_snapshot!(go, @r"
        package main

        type s struct{}

        func f(x int) int {
            var r int = 0
            switch x {
            case 1:
                fallthrough
            case 2:
                r = 1
            case 3:
                r = 3
                fallthrough
            default:
                r = 4
            }
            return r
        }

        func newS() *s {
            this := &s{}
            return this
        }
        ");
    }

    #[test]
    fn switch_value_returns_from_closure() {
        let go = single(
            r#"
class Codes {
    static String name(int x) {
        String s = switch (x) {
            case 1 -> "one";
            case 2 -> {
                String t = "tw";
                yield t + "o";
            }
            default -> "many";
        };
        return s;
    }

    static int code(int x) {
        return switch (x) {
            case 1:
                yield 10;
            default:
                yield 0;
        };
    }
}
"#,
        );
        assert!(
            go.contains(
                "    var s string = func() string {
        switch x {
        case 1:
            return \"one\"
        case 2:
            var t string = \"tw\"
            return t + \"o\"
        default:
            return \"many\"
        }
    }()
    return s
"
            ),
            "{go}"
        );
        assert!(
            go.contains(
                "    return func() int {
        switch x {
        case 1:
            return 10
        default:
            return 0
        }
    }()
"
            ),
            "{go}"
        );
    }

    #[test]
    fn switch_value_without_default_panics_after_the_switch() {
        let go = single(
            r#"
class S {
    static int code(int x) {
        return switch (x) {
            case 1 -> 10;
            case 2 -> 20;
        };
    }
}
"#,
        );
        assert!(go.contains("        }\n        panic(\"unreachable\")\n    }()\n"), "{go}");
    }

    #[test]
    fn ternary_uses_helper() {
        let go = single("class T { static int pick(boolean c) { return c ? 1 : 2; } }");
        assert!(go.contains("return ternary(c, 1, 2)"), "{go}");
        assert!(go.contains("func ternary[T any](cond bool, a T, b T) T {"), "{go}");
    }

    /// The helper is an ordinary call, so Go evaluates both branches
    /// before choosing one.
    #[test]
    fn ternary_evaluates_both_branches() {
        let go = single(
            r#"
class T {
    static int left() { return 1; }
    static int right() { return 2; }
    static int pick(boolean c) { return c ? left() : right(); }
}
"#,
        );
        assert!(go.contains("return ternary(c, left(), right())"), "{go}");
    }

    #[test]
    fn unsigned_shift_goes_through_unsigned_type() {
        let go = single(
            r#"
class Bits {
    static int f(int x, long y, byte b) {
        b >>>= 1;
        long z = y >>> 3;
        return x >>> 28;
    }
}
"#,
        );
        assert!(go.contains("b = int8(int(uint32(b) >> 1))"), "{go}");
        assert!(go.contains("var z int64 = int64(uint64(y) >> 3)"), "{go}");
        assert!(go.contains("return int(uint32(x) >> 28)"), "{go}");
    }

    #[test]
    fn local_declared_later_does_not_shadow_field() {
        let go = single(
            r#"
class A {
    int value = 1;

    int f() {
        int r = value;
        int value = 3;
        return r + value;
    }
}
"#,
        );
        assert!(go.contains("    var r int = this.value\n"), "{go}");
        assert!(go.contains("    var value int = 3\n"), "{go}");
        assert!(go.contains("    return r + value\n"), "{go}");
    }

    #[test]
    fn sibling_blocks_keep_their_own_local_types() {
        let go = single(
            r#"
class A {
    static void f(boolean c) {
        String s = "";
        int n = 0;
        if (c) {
            String x = "a";
            s = x + 1;
        } else {
            int x = 2;
            n = x + 1;
        }
    }
}
"#,
        );
        assert!(go.contains("s = x + fmt.Sprint(1)"), "{go}");
        assert!(go.contains("n = x + 1"), "{go}");
    }

    #[test]
    fn sibling_try_blocks_keep_their_locals_apart() {
        let go = single(
            r#"
class T {
    static int f() {
        int total = 0;
        try {
            int x = 1;
            total += x;
        } finally {
            total++;
        }
        try {
            int x = 2;
            total += x;
        } catch (Exception e) {
            total = 0;
        }
        synchronized (T.class) {
            int y = 3;
            total += y;
        }
        return total;
    }
}
"#,
        );
        assert!(
            go.contains(
                "    var total int = 0
    {
        var x int = 1
        total += x
    }
    total++
    {
        var x int = 2
        total += x
    }
    {
        var y int = 3
        total += y
    }
    return total
"
            ),
            "{go}"
        );
    }

    #[test]
    fn octal_escapes_are_widened() {
        let go = single(r#"class E { static String s = "a\0b\12"; static char c = '\0'; }"#);
        assert!(go.contains(r#""a\000b\012""#), "{go}");
        assert!(go.contains(r"'\000'"), "{go}");
    }

    #[test]
    fn string_concatenation_stringifies() {
        let go = single(r#"class T { static String f(int n) { return "n=" + n; } }"#);
        assert!(go.contains("return \"n=\" + fmt.Sprint(n)"), "{go}");
    }
}

// ============================================================================
// Packages and diagnostics
// ============================================================================

mod packages {
    use super::*;
    use javago_transpile::LowerOptions;

    #[test]
    fn unresolved_import_keeps_spelling() {
        let translation = run(&[(
            "A.java",
            "import org.missing.Widget; public class A { Widget w; int ok; }",
        )]);
        assert!(translation.is_success());
        let go = render(&translation, "A.java");
        assert!(go.contains("w Widget"), "{go}");
        assert!(go.contains("ok int"), "{go}");
        assert!(
            translation
                .diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::UnresolvedType && d.message.contains("Widget")),
            "{:?}",
            translation.diagnostics
        );
    }

    #[test]
    fn cross_package_reference_imports_module_path() {
        let options = TranslateOptions {
            lower: LowerOptions {
                module: "example.com/app".into(),
                ..LowerOptions::default()
            },
            ..TranslateOptions::default()
        };
        let translation = run_with(
            &[
                (
                    "com/app/App.java",
                    "package com.app; import com.model.Item; public class App { Item item; }",
                ),
                ("com/model/Item.java", "package com.model; public class Item {}"),
            ],
            &options,
        );
        let go = render(&translation, "com/app/App.java");
        assert!(go.starts_with("package app\n"), "{go}");
        assert!(go.contains("import \"example.com/app/com/model\""), "{go}");
        assert!(go.contains("item *model.Item"), "{go}");
        assert!(render(&translation, "com/model/Item.java").starts_with("package model\n"));
    }

    #[test]
    fn unhandled_method_is_skipped() {
        let translation = run(&[(
            "A.java",
            "class A { Runnable r() { return new Runnable() { public void run() {} }; } int ok() { return 1; } }",
        )]);
        assert!(translation.is_success());
        let go = render(&translation, "A.java");
        assert!(!go.contains(") r() "), "{go}");
        assert!(go.contains("func (this *a) ok() int {"), "{go}");
        assert!(
            translation
                .diagnostics
                .iter()
                .any(|d| d.kind == DiagnosticKind::UnhandledNodeKind),
            "{:?}",
            translation.diagnostics
        );
    }

    #[test]
    fn scope_tree_serializes() {
        let translation = run(&[("Main.java", "public class Main { private int count; }")]);
        let json: serde_json::Value =
            serde_json::from_str(&translation.scopes.to_json().unwrap()).unwrap();
        let text = json.to_string();
        assert!(text.contains("\"Main\""), "{text}");
        assert!(text.contains("\"count\""), "{text}");
    }
}
