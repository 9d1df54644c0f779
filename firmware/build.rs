fn main() {
    println!("cargo::rustc-link-arg-tests=-Tembedded-test.x");
}
