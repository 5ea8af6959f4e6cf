//! Known-answer and behavioral tests for the authenticated-encryption layer.

use sm4_gcm::{batch, gcm::Sm4Gcm, sm4, Error};

const KEY: &str = "0123456789abcdeffedcba9876543210";
const IV: &str = "0123456789abcdeffedcba98";

fn instance(key_hex: &str, iv_hex: &str) -> Sm4Gcm {
    let mut gcm = Sm4Gcm::new(&hex::decode(key_hex).unwrap()).unwrap();
    gcm.set_iv(&hex::decode(iv_hex).unwrap()).unwrap();
    gcm
}

#[test]
fn short_message_with_date_header() {
    let gcm = instance(KEY, IV);
    let (ct, tag) = gcm.encrypt_and_authenticate(b"WZJ", b"20040402", 16).unwrap();

    assert_eq!(hex::encode(&ct), "ec0d4f");
    assert_eq!(hex::encode(&tag), "101d16a309cfdc565ca251b7edbce505");

    let pt = gcm.decrypt_and_verify(&ct, b"20040402", &tag).unwrap();
    assert_eq!(pt, b"WZJ");
}

#[test]
fn empty_message_still_authenticates() {
    let gcm = instance(KEY, IV);
    let (ct, tag) = gcm.encrypt_and_authenticate(b"", b"", 16).unwrap();

    assert!(ct.is_empty());
    assert_eq!(hex::encode(&tag), "bb5705c407068aa9095e7e79e4030b29");
    assert_eq!(gcm.decrypt_and_verify(&[], b"", &tag).unwrap(), b"");
}

#[test]
fn multi_block_message_with_truncated_tag() {
    let gcm = instance(KEY, IV);
    let pt: Vec<u8> = (0u8..=32).collect();
    let aad: Vec<u8> = (0xa0u8..0xb4).collect();

    let (ct, tag) = gcm.encrypt_and_authenticate(&pt, &aad, 12).unwrap();
    assert_eq!(
        hex::encode(&ct),
        "bb5607c703038cae01577472e80e0526371d2ebabbf69d3644fe0263069504367b"
    );
    assert_eq!(hex::encode(&tag), "54257152944e5ce6e50aec0e");

    assert_eq!(gcm.decrypt_and_verify(&ct, &aad, &tag).unwrap(), pt);
}

#[test]
fn sixty_byte_message_under_second_key() {
    let gcm = instance("000102030405060708090a0b0c0d0e0f", "cafebabefacedbaddecaf888");
    let pt = hex::decode(
        "d9313225f88406e5a55909c5aff5269a86a7a9531534f7da2e4c303d8a318a72\
         1c3c0c95956809532fcf0e2449a6b525b16aedf5aa0de657ba637b39",
    )
    .unwrap();
    let aad = hex::decode("feedfacedeadbeeffeedfacedeadbeefabaddad2").unwrap();

    let (ct, tag) = gcm.encrypt_and_authenticate(&pt, &aad, 16).unwrap();
    assert_eq!(
        hex::encode(&ct),
        "2c98165417efbaa1052cc81c28f7f2cad138e6d5ba3b39cb579fc46e92ff9394\
         289804552fb6dd15d74b1714cc7d97d56eb6e92448e40baa52d76a36"
    );
    assert_eq!(hex::encode(&tag), "9a76ede5bdc326b30950b4c97bc6dcad");
}

#[test]
fn round_trips_across_message_lengths() {
    let gcm = instance(KEY, IV);
    let aad = b"associated";

    for len in 0..70 {
        let pt: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();
        let (ct, tag) = gcm.encrypt_and_authenticate(&pt, aad, 16).unwrap();
        assert_eq!(ct.len(), pt.len());
        let opened = gcm.decrypt_and_verify(&ct, aad, &tag).unwrap();
        assert_eq!(opened, pt, "length {}", len);
    }
}

#[test]
fn encryption_is_deterministic_per_iv() {
    let gcm = instance(KEY, IV);
    let first = gcm.encrypt_and_authenticate(b"repeat", b"", 16).unwrap();
    let second = gcm.encrypt_and_authenticate(b"repeat", b"", 16).unwrap();
    assert_eq!(first, second);
}

#[test]
fn changing_the_iv_changes_everything() {
    let a = instance(KEY, IV);
    let b = instance(KEY, "0123456789abcdeffedcba99");

    let (ct_a, tag_a) = a.encrypt_and_authenticate(b"same input", b"", 16).unwrap();
    let (ct_b, tag_b) = b.encrypt_and_authenticate(b"same input", b"", 16).unwrap();
    assert_ne!(ct_a, ct_b);
    assert_ne!(tag_a, tag_b);
}

#[test]
fn every_tag_bit_is_load_bearing() {
    let gcm = instance(KEY, IV);
    let (ct, tag) = gcm.encrypt_and_authenticate(b"integrity", b"aad", 16).unwrap();

    for byte in 0..tag.len() {
        for bit in 0..8 {
            let mut forged = tag.clone();
            forged[byte] ^= 1 << bit;
            assert!(matches!(
                gcm.decrypt_and_verify(&ct, b"aad", &forged),
                Err(Error::AuthenticationFailure)
            ));
        }
    }
}

#[test]
fn tampered_ciphertext_or_aad_is_rejected() {
    let gcm = instance(KEY, IV);
    let (ct, tag) = gcm
        .encrypt_and_authenticate(b"a longer message spanning blocks!", b"aad", 16)
        .unwrap();

    let mut bad_ct = ct.clone();
    bad_ct[17] ^= 0x80;
    assert!(matches!(
        gcm.decrypt_and_verify(&bad_ct, b"aad", &tag),
        Err(Error::AuthenticationFailure)
    ));

    assert!(matches!(
        gcm.decrypt_and_verify(&ct, b"axd", &tag),
        Err(Error::AuthenticationFailure)
    ));
}

#[test]
fn truncated_tags_verify_when_issued_truncated() {
    let gcm = instance(KEY, IV);
    for tag_len in 1..=16 {
        let (ct, tag) = gcm.encrypt_and_authenticate(b"msg", b"", tag_len).unwrap();
        assert_eq!(tag.len(), tag_len);
        assert_eq!(gcm.decrypt_and_verify(&ct, b"", &tag).unwrap(), b"msg");
    }
}

#[test]
fn single_plaintext_bit_flips_avalanche() {
    let gcm = instance(KEY, IV);
    let pt_a = vec![0u8; 32];
    let mut pt_b = pt_a.clone();
    pt_b[0] ^= 1;

    let (ct_a, tag_a) = gcm.encrypt_and_authenticate(&pt_a, b"", 16).unwrap();
    let (ct_b, tag_b) = gcm.encrypt_and_authenticate(&pt_b, b"", 16).unwrap();

    // Counter mode: ciphertexts differ in exactly the flipped bit...
    let diff: u32 = ct_a
        .iter()
        .zip(ct_b.iter())
        .map(|(a, b)| (a ^ b).count_ones())
        .sum();
    assert_eq!(diff, 1);

    // ...but the tag diffuses it.
    let tag_diff: u32 = tag_a
        .iter()
        .zip(tag_b.iter())
        .map(|(a, b)| (a ^ b).count_ones())
        .sum();
    assert!(tag_diff >= 32, "tag distance only {} bits", tag_diff);
}

#[test]
fn rejects_bad_key_and_iv_lengths() {
    assert!(matches!(
        Sm4Gcm::<sm4::Schedule>::new(&[0u8; 15]),
        Err(Error::InvalidKeyLength(15))
    ));
    assert!(matches!(
        Sm4Gcm::<sm4::Schedule>::new(&[0u8; 32]),
        Err(Error::InvalidKeyLength(32))
    ));

    let mut gcm: Sm4Gcm = Sm4Gcm::new(&hex::decode(KEY).unwrap()).unwrap();
    assert!(matches!(
        gcm.set_iv(b"too-short"),
        Err(Error::UnsupportedIvLength(9))
    ));
}

#[test]
fn backends_produce_identical_sealed_messages() {
    let key = hex::decode(KEY).unwrap();
    let iv = hex::decode(IV).unwrap();
    let pt: Vec<u8> = (0..512u32).map(|i| (i * 7) as u8).collect();

    let mut scalar: Sm4Gcm<sm4::Schedule> = Sm4Gcm::new(&key).unwrap();
    scalar.set_iv(&iv).unwrap();
    let mut wide: Sm4Gcm<batch::Schedule> = Sm4Gcm::new(&key).unwrap();
    wide.set_iv(&iv).unwrap();

    let sealed_scalar = scalar.encrypt_and_authenticate(&pt, b"hdr", 16).unwrap();
    let sealed_wide = wide.encrypt_and_authenticate(&pt, b"hdr", 16).unwrap();
    assert_eq!(sealed_scalar, sealed_wide);
}

#[test]
fn parallel_seal_matches_serial() {
    let gcm = instance(KEY, IV);
    let pt: Vec<u8> = (0..40_000u32).map(|i| (i % 251) as u8).collect();

    let serial = gcm.encrypt_and_authenticate(&pt, b"bulk", 16).unwrap();
    let threaded = gcm
        .encrypt_and_authenticate_parallel(&pt, b"bulk", 16, 4)
        .unwrap();
    assert_eq!(serial, threaded);

    let opened = gcm
        .decrypt_and_verify_parallel(&threaded.0, b"bulk", &threaded.1, 4)
        .unwrap();
    assert_eq!(opened, pt);
}
