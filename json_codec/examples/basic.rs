use chrono::{NaiveDateTime, Utc};
use json_codec::{CodecRegistry, JsonCodec};
use uuid::Uuid;

#[derive(JsonCodec, Debug, PartialEq)]
#[json_codec(discriminator = "type")]
struct Example {
    id: i64,
    version: Uuid,
    created: NaiveDateTime,
}

#[derive(JsonCodec, Debug, PartialEq)]
#[json_codec(discriminator = "type", extends = Example)]
struct Another {
    id: i64,
    version: Uuid,
    created: NaiveDateTime,
    name: String,
}

fn main() -> Result<(), json_codec::Error> {
    let mut r = CodecRegistry::new();
    r.register::<Example>()?;
    r.register::<Another>()?;

    let example = r.codec::<Example>()?;
    println!("{}", serde_json::to_string_pretty(&example.schema())?);

    let another = Another {
        id: 1,
        version: Uuid::new_v4(),
        created: Utc::now().naive_utc(),
        name: "thsutton".to_string(),
    };
    let tree = example.encode(&another)?;
    println!("{tree}");

    let decoded = example.decode(&tree)?;
    println!("{decoded:?}");
    assert_eq!(decoded.downcast_ref::<Another>(), Some(&another));
    Ok(())
}
