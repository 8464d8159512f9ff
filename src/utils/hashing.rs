use bcrypt::BcryptError;

pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(password, cost)
}

pub fn verify_password(password: &str, hashed: &str) -> Result<bool, BcryptError> {
    bcrypt::verify(password, hashed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hashed = hash_password("Sup3rSecret", 4).unwrap();
        assert_ne!(hashed, "Sup3rSecret");
        assert!(verify_password("Sup3rSecret", &hashed).unwrap());
        assert!(!verify_password("wrong", &hashed).unwrap());
    }
}
