use fake::faker::address::en::*;
use fake::faker::company::en::*;
use fake::faker::internet::en::*;
use fake::faker::lorem::en::*;
use fake::faker::name::en::*;
use fake::faker::phone_number::en::*;
use fake::Fake;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::Value;

/// Generate a value for a built-in generator path, or `None` for an
/// unrecognized path (the caller reports the error with field context).
///
/// Paths follow the provider-namespace convention callers already use in
/// their schemas (`internet.url`, `name.firstName`, ...). Arguments are
/// ignored except where noted.
pub fn builtin_value(path: &str, args: &[Value], rng: &mut StdRng) -> Option<Value> {
    let value = match path {
        // === Identity ===
        "name.firstName" => string(FirstName().fake_with_rng::<String, _>(rng)),
        "name.lastName" => string(LastName().fake_with_rng::<String, _>(rng)),
        "name.fullName" | "name.findName" => string(Name().fake_with_rng::<String, _>(rng)),
        "internet.userName" => string(Username().fake_with_rng::<String, _>(rng)),

        // === Contact ===
        "internet.email" => string(SafeEmail().fake_with_rng::<String, _>(rng)),
        "phone.number" => string(PhoneNumber().fake_with_rng::<String, _>(rng)),

        // === Internet ===
        "internet.url" => {
            let host: String = Word().fake_with_rng(rng);
            let suffix: String = DomainSuffix().fake_with_rng(rng);
            string(format!("https://{}.{}", host, suffix))
        }
        "internet.ip" => string(IPv4().fake_with_rng::<String, _>(rng)),

        // === Text ===
        "lorem.word" => string(Word().fake_with_rng::<String, _>(rng)),
        // `lorem.words` honors an optional word count argument
        "lorem.words" => {
            let count = args
                .first()
                .and_then(Value::as_u64)
                .map(|n| n.max(1) as usize)
                .unwrap_or(3);
            let words: Vec<String> = Words(count..count + 1).fake_with_rng(rng);
            string(words.join(" "))
        }
        "lorem.sentence" => string(Sentence(4..9).fake_with_rng::<String, _>(rng)),

        // === Address ===
        "address.city" => string(CityName().fake_with_rng::<String, _>(rng)),
        "address.streetName" => string(StreetName().fake_with_rng::<String, _>(rng)),
        "address.zipCode" => string(ZipCode().fake_with_rng::<String, _>(rng)),

        // === Company ===
        "company.name" => string(CompanyName().fake_with_rng::<String, _>(rng)),

        // === Random ===
        "random.uuid" => string(random_uuid(rng)),
        "random.number" => {
            let max = args.first().and_then(Value::as_i64).unwrap_or(10_000);
            Value::from(rng.random_range(0..=max.max(0)))
        }
        "random.boolean" => Value::Bool(rng.random()),

        _ => return None,
    };
    Some(value)
}

/// A v4-format UUID drawn from the synthesis RNG, so a fixed seed produces a
/// fixed identifier sequence.
pub fn random_uuid(rng: &mut StdRng) -> String {
    uuid::Builder::from_random_bytes(rng.random())
        .into_uuid()
        .to_string()
}

/// Same, without hyphens — the shape document stores use for object ids.
pub fn random_hex_id(rng: &mut StdRng) -> String {
    uuid::Builder::from_random_bytes(rng.random())
        .into_uuid()
        .simple()
        .to_string()
}

fn string(s: String) -> Value {
    Value::String(s)
}
