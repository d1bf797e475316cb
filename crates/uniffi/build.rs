fn main() {
    uniffi::generate_scaffolding("src/textlens.udl").unwrap();
}
