fn main() {
    println!("see the jvm-tools binary for the command-line interface");
}
